//! trix-mentions-core: `@mention` autocomplete logic without framework dependencies.
//!
//! This crate provides:
//! - `query` - trigger-key query detection under the cursor
//! - `Combobox` - keyboard/pointer selection over a popup list
//! - `MentionExpander<H>` - the interaction state machine, generic over `EditorHost`
//! - `PlainHost` / `MenuList` - ropey-backed and in-memory collaborators for
//!   hosts without a DOM (and for tests)
//!
//! The host editor, the popup list and the fallback content frame are reached
//! through traits, so the same logic runs behind a browser binding or a native UI.

pub mod attachment;
pub mod combobox;
pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod expander;
pub mod frame;
pub mod host;
pub mod keys;
pub mod listbox;
pub mod plain;
pub mod query;
pub mod types;

pub use attachment::{ATTACHMENT_ATTRIBUTE, Attachment, AttachmentOptions};
pub use combobox::{Combobox, ComboboxKey, Direction};
pub use config::{Attributes, ExpanderOptions, MentionsConfig, parse_trigger_keys};
pub use debounce::{DEBOUNCE_DELAY, DebounceTicket, Debouncer};
pub use error::MentionsError;
pub use events::{
    CandidateFuture, CandidateListener, Candidates, CandidatesNeeded, CommitEvent,
    CommitListener, LocalBoxFuture, ProviderError, Verdict,
};
pub use expander::{CycleId, CycleOutcome, CycleResolution, MentionExpander, Phase, ProviderCycle};
pub use frame::frame_url;
pub use host::{EditorHost, FrameTarget, HostError, InputElement};
pub use keys::{Key, KeyEvent, KeydownResult, Modifiers};
pub use listbox::{ElementData, ListOption, Listbox, MenuItem, MenuList};
pub use plain::PlainHost;
pub use query::{QueryMatch, QueryOptions, query};
pub use smol_str::SmolStr;
pub use types::{CursorRect, Match, TriggerKey};
