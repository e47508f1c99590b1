//! Popup list abstraction.
//!
//! A `Listbox` is the provider-supplied menu the combobox navigates. The
//! expander attaches, shows, hides and positions it but does not own its
//! content. `MenuList` is an in-memory implementation for hosts without a DOM.

use std::collections::BTreeMap;

use smol_str::SmolStr;

/// Content and attributes of one option element.
///
/// Used to build the attachment inserted on commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementData {
    /// Inner markup of the element.
    pub content: String,
    pub attributes: BTreeMap<String, String>,
}

impl ElementData {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Snapshot of one `role="option"` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ListOption {
    pub id: Option<SmolStr>,
    pub hidden: bool,
    pub width: f64,
    pub height: f64,
    /// Offset of the option's top edge within the scrolling list.
    pub offset_top: f64,
    pub selected: bool,
    /// `aria-disabled="true"`.
    pub disabled: bool,
}

impl ListOption {
    /// Hidden or zero-sized options are skipped by navigation.
    pub fn is_visible(&self) -> bool {
        !self.hidden && (self.width > 0.0 || self.height > 0.0)
    }
}

/// A popup list of selectable options.
pub trait Listbox {
    fn id(&self) -> Option<SmolStr>;

    fn set_id(&mut self, id: SmolStr);

    /// Whether the list is already part of the host tree.
    fn is_connected(&self) -> bool;

    fn set_hidden(&mut self, hidden: bool);

    /// Position the list, in pixels relative to the widget.
    fn set_position(&mut self, top: f64, left: f64);

    /// The option entries, in document order.
    fn options(&self) -> Vec<ListOption>;

    /// Mark an option selected (`aria-selected`).
    fn set_selected(&mut self, index: usize, selected: bool);

    fn scroll_top(&self) -> f64;

    /// Visible height of the scrolling container.
    fn client_height(&self) -> f64;

    fn set_scroll_top(&mut self, top: f64);

    /// Content and attributes of the option at `index`.
    fn element(&self, index: usize) -> Option<ElementData>;

    /// Whether the list has no content at all.
    fn is_empty(&self) -> bool {
        self.options().is_empty()
    }
}

const DEFAULT_ITEM_WIDTH: f64 = 200.0;
const DEFAULT_ITEM_HEIGHT: f64 = 24.0;

/// One entry of a `MenuList`.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub option: ListOption,
    pub element: ElementData,
}

impl MenuItem {
    pub fn new(id: impl Into<SmolStr>, content: impl Into<String>) -> Self {
        Self {
            option: ListOption {
                id: Some(id.into()),
                hidden: false,
                width: DEFAULT_ITEM_WIDTH,
                height: DEFAULT_ITEM_HEIGHT,
                offset_top: 0.0,
                selected: false,
                disabled: false,
            },
            element: ElementData::new(content),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.option.disabled = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.option.hidden = true;
        self
    }

    /// Give the item zero size, as an unrendered element would have.
    pub fn collapsed(mut self) -> Self {
        self.option.width = 0.0;
        self.option.height = 0.0;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.element = self.element.with_attribute(name, value);
        self
    }
}

/// In-memory popup list.
///
/// Items are stacked vertically; each item's `offset_top` is the sum of the
/// heights before it.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuList {
    id: Option<SmolStr>,
    connected: bool,
    hidden: bool,
    position: Option<(f64, f64)>,
    scroll_top: f64,
    client_height: f64,
    items: Vec<MenuItem>,
}

impl Default for MenuList {
    fn default() -> Self {
        Self {
            id: None,
            connected: false,
            hidden: false,
            position: None,
            scroll_top: 0.0,
            client_height: DEFAULT_ITEM_HEIGHT * 5.0,
            items: Vec::new(),
        }
    }
}

impl MenuList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<SmolStr>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Mark the list as already present in the host tree.
    pub fn connected(mut self) -> Self {
        self.connected = true;
        self
    }

    pub fn with_client_height(mut self, height: f64) -> Self {
        self.client_height = height;
        self
    }

    pub fn with_item(mut self, item: MenuItem) -> Self {
        self.push(item);
        self
    }

    pub fn push(&mut self, mut item: MenuItem) {
        item.option.offset_top = self.items.iter().map(|i| i.option.height).sum();
        self.items.push(item);
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Position set by the last `set_position`, as `(top, left)`.
    pub fn position(&self) -> Option<(f64, f64)> {
        self.position
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Index of the first selected item.
    pub fn selected_index(&self) -> Option<usize> {
        self.items.iter().position(|i| i.option.selected)
    }
}

impl Listbox for MenuList {
    fn id(&self) -> Option<SmolStr> {
        self.id.clone()
    }

    fn set_id(&mut self, id: SmolStr) {
        self.id = Some(id);
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    fn set_position(&mut self, top: f64, left: f64) {
        self.position = Some((top, left));
    }

    fn options(&self) -> Vec<ListOption> {
        self.items.iter().map(|i| i.option.clone()).collect()
    }

    fn set_selected(&mut self, index: usize, selected: bool) {
        if let Some(item) = self.items.get_mut(index) {
            item.option.selected = selected;
        }
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn client_height(&self) -> f64 {
        self.client_height
    }

    fn set_scroll_top(&mut self, top: f64) {
        self.scroll_top = top;
    }

    fn element(&self, index: usize) -> Option<ElementData> {
        self.items.get(index).map(|i| i.element.clone())
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_stack() {
        let menu = MenuList::new()
            .with_item(MenuItem::new("a", "A"))
            .with_item(MenuItem::new("b", "B").collapsed())
            .with_item(MenuItem::new("c", "C"));
        let offsets: Vec<f64> = menu.options().iter().map(|o| o.offset_top).collect();
        assert_eq!(offsets, vec![0.0, 24.0, 24.0]);
    }

    #[test]
    fn test_visibility() {
        let menu = MenuList::new()
            .with_item(MenuItem::new("a", "A"))
            .with_item(MenuItem::new("b", "B").hidden())
            .with_item(MenuItem::new("c", "C").collapsed());
        let visible: Vec<bool> = menu.options().iter().map(ListOption::is_visible).collect();
        assert_eq!(visible, vec![true, false, false]);
    }

    #[test]
    fn test_element_attributes() {
        let menu = MenuList::new()
            .with_item(MenuItem::new("a", "<b>Ann</b>").with_attribute("data-id", "7"));
        let element = menu.element(0).unwrap();
        assert_eq!(element.content, "<b>Ann</b>");
        assert_eq!(element.attribute("data-id"), Some("7"));
        assert!(menu.element(1).is_none());
    }
}
