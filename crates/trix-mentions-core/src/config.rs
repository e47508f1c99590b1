//! Widget configuration.
//!
//! Two layers: `ExpanderOptions` is fixed when the expander is built, while
//! `MentionsConfig` is materialized from the widget's declarative attributes
//! on every match attempt so attribute changes apply immediately.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::debounce::DEBOUNCE_DELAY;
use crate::types::TriggerKey;

/// Attribute holding the space-separated trigger keys.
pub const KEYS_ATTRIBUTE: &str = "keys";
/// Attribute listing the multi-word keys; present but empty means all keys.
pub const MULTIWORD_ATTRIBUTE: &str = "multiword";
/// Data source URL for the fallback frame.
pub const SRC_ATTRIBUTE: &str = "src";
/// Query parameter name for the fallback frame.
pub const NAME_ATTRIBUTE: &str = "name";
/// Id of the fallback content frame.
pub const FRAME_ATTRIBUTE: &str = "data-turbo-frame";

/// Read-only attribute access on the widget element.
pub trait Attributes {
    /// Get an attribute value.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Check whether an attribute is present (possibly empty).
    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }
}

impl Attributes for BTreeMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Attributes for HashMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Construction-time options for a `MentionExpander`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderOptions {
    /// Trailing-edge debounce window for edit events.
    pub debounce_ms: u64,
    /// Local name the bound editor element must have.
    pub editor_element: String,
    /// Honor Ctrl+N / Ctrl+P list navigation (macOS convention).
    pub ctrl_bindings: bool,
    /// Prefix for ids assigned to popup menus that have none.
    pub menu_id_prefix: String,
}

impl Default for ExpanderOptions {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_DELAY.as_millis() as u64,
            editor_element: "trix-editor".to_string(),
            ctrl_bindings: false,
            menu_id_prefix: "trix-mentions".to_string(),
        }
    }
}

impl ExpanderOptions {
    /// The debounce window as a `Duration`.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Declarative configuration read from the widget element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionsConfig {
    /// Trigger keys in priority order.
    pub keys: Vec<TriggerKey>,
    pub src: Option<String>,
    pub name: Option<String>,
    pub frame_id: Option<String>,
}

impl MentionsConfig {
    pub fn from_attributes<A: Attributes + ?Sized>(attrs: &A) -> Self {
        let keys = attrs.attribute(KEYS_ATTRIBUTE);
        let multiword = attrs.attribute(MULTIWORD_ATTRIBUTE);
        Self {
            keys: parse_trigger_keys(keys.as_deref(), multiword.as_deref()),
            src: attrs.attribute(SRC_ATTRIBUTE),
            name: attrs.attribute(NAME_ATTRIBUTE),
            frame_id: attrs.attribute(FRAME_ATTRIBUTE),
        }
    }
}

/// Parse the `keys` and `multiword` attribute values.
///
/// A `multiword` attribute that is present but lists no keys makes every
/// key multi-word.
pub fn parse_trigger_keys(keys: Option<&str>, multiword: Option<&str>) -> Vec<TriggerKey> {
    let multi: Vec<&str> = multiword
        .map(|m| m.split(' ').filter(|k| !k.is_empty()).collect())
        .unwrap_or_default();
    let all_multi = multi.is_empty() && multiword.is_some();

    keys.unwrap_or_default()
        .split(' ')
        .filter(|k| !k.is_empty())
        .map(|key| TriggerKey {
            key: key.into(),
            multi_word: all_multi || multi.contains(&key),
        })
        .collect()
}
