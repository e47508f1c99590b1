//! Host editor abstraction.
//!
//! These traits define the interface between the mention logic and the
//! editor that owns the document (a browser rich-text element, a native text
//! view, ...). The expander never touches a document directly: it reads text
//! and cursor, asks for caret geometry, and issues one range-replace mutation.

use std::ops::Range;

use url::Url;

use crate::attachment::Attachment;
use crate::config::Attributes;
use crate::events::LocalBoxFuture;
use crate::listbox::Listbox;
use crate::types::CursorRect;

/// Error type for host operations.
#[derive(Debug, Clone)]
pub struct HostError(pub String);

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for HostError {}

impl From<&str> for HostError {
    fn from(s: &str) -> Self {
        HostError(s.to_string())
    }
}

impl From<String> for HostError {
    fn from(s: String) -> Self {
        HostError(s)
    }
}

/// The focusable text input the popup is attached to.
///
/// Carries the ARIA role/attribute plumbing the combobox needs.
pub trait InputElement {
    /// Set an attribute on the input element.
    fn set_attribute(&mut self, name: &str, value: &str);

    /// Remove an attribute from the input element.
    fn remove_attribute(&mut self, name: &str);

    /// Move focus to the input element without scrolling.
    fn focus(&mut self);
}

/// A network-content frame used when no provider answers a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTarget {
    /// Element id of the frame.
    pub id: String,
    /// The frame's current `src`, if any.
    pub src: Option<String>,
    /// Base URI relative sources resolve against.
    pub base_uri: String,
}

/// Host editor operations.
///
/// Implementations wrap the actual editor element. The browser
/// implementation forwards to the rich-text editor's API, `PlainHost` keeps
/// everything in a rope.
pub trait EditorHost: InputElement {
    /// Popup list type supplied by providers.
    type Menu: Listbox + 'static;

    /// Declarative configuration source (the widget element's attributes).
    type Widget: Attributes + ?Sized;

    /// Local name of the bound editor element, checked against
    /// `ExpanderOptions::editor_element`.
    fn element_name(&self) -> &str;

    /// The widget's configuration attributes, read live on each match attempt.
    fn widget(&self) -> &Self::Widget;

    /// Current plain-text content of the document.
    fn text(&self) -> String;

    /// Current cursor offset in chars.
    fn cursor(&self) -> usize;

    /// Whether the editor currently has focus.
    ///
    /// Must also report true when focus sits inside an encapsulated sub-tree
    /// whose active element is the editor.
    fn is_focused(&self) -> bool;

    /// Screen rectangle of the caret at the given offset.
    ///
    /// Returns None if the offset cannot be mapped to screen coordinates.
    fn caret_rect(&self, offset: usize) -> Option<CursorRect>;

    /// Replace a char range with an attachment, leaving the cursor after it.
    fn replace_with_attachment(
        &mut self,
        range: Range<usize>,
        attachment: Attachment,
    ) -> Result<(), HostError>;

    /// Insert a menu that is not yet part of the host tree.
    fn attach_menu(&mut self, menu: &mut Self::Menu);

    /// Remove a menu previously inserted with `attach_menu`.
    fn detach_menu(&mut self, menu: Self::Menu);

    /// Look up an enabled content frame by id.
    fn find_frame(&self, _id: &str) -> Option<FrameTarget> {
        None
    }

    /// Point the frame at `url` and resolve with its content once loaded.
    ///
    /// Resolves to None when the frame could not be loaded.
    fn load_frame(
        &mut self,
        _frame: &FrameTarget,
        _url: Url,
    ) -> LocalBoxFuture<Option<Self::Menu>> {
        Box::pin(async { None })
    }
}
