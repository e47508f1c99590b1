//! Rope-backed host for environments without a DOM.
//!
//! `PlainHost` keeps the document in a `ropey::Rope`, renders attachments as
//! U+FFFC object replacement characters, and lays the caret out on a fixed
//! character grid. Frame loads are answered from preloaded responses.

use std::collections::BTreeMap;
use std::ops::Range;

use url::Url;

use crate::attachment::Attachment;
use crate::events::LocalBoxFuture;
use crate::host::{EditorHost, FrameTarget, HostError, InputElement};
use crate::listbox::MenuList;
use crate::types::CursorRect;

/// Placeholder char standing in for an attachment in the text.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

#[derive(Debug, Clone)]
pub struct PlainHost {
    rope: ropey::Rope,
    cursor: usize,
    focused: bool,
    element_name: String,
    input_attributes: BTreeMap<String, String>,
    widget: BTreeMap<String, String>,
    attachments: Vec<Attachment>,
    attached_menus: usize,
    detached_menus: Vec<MenuList>,
    focus_count: usize,
    frames: BTreeMap<String, (FrameTarget, Option<MenuList>)>,
    frame_requests: Vec<Url>,
    char_width: f64,
    line_height: f64,
}

impl Default for PlainHost {
    fn default() -> Self {
        Self::new("")
    }
}

impl PlainHost {
    /// Create a focused host with the cursor at the end of `text`.
    pub fn new(text: &str) -> Self {
        let rope = ropey::Rope::from_str(text);
        let cursor = rope.len_chars();
        Self {
            rope,
            cursor,
            focused: true,
            element_name: "trix-editor".to_string(),
            input_attributes: BTreeMap::new(),
            widget: BTreeMap::new(),
            attachments: Vec::new(),
            attached_menus: 0,
            detached_menus: Vec::new(),
            focus_count: 0,
            frames: BTreeMap::new(),
            frame_requests: Vec::new(),
            char_width: 8.0,
            line_height: 16.0,
        }
    }

    pub fn with_widget_attribute(mut self, name: &str, value: &str) -> Self {
        self.widget.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_element_name(mut self, name: &str) -> Self {
        self.element_name = name.to_string();
        self
    }

    /// Register a frame; `response` is what loading it yields.
    pub fn with_frame(mut self, frame: FrameTarget, response: Option<MenuList>) -> Self {
        self.frames.insert(frame.id.clone(), (frame, response));
        self
    }

    /// Insert text at the cursor and move the cursor past it.
    pub fn type_text(&mut self, text: &str) {
        self.rope.insert(self.cursor, text);
        self.cursor += text.chars().count();
    }

    /// Move the cursor, clamped to the document.
    pub fn set_cursor(&mut self, offset: usize) {
        self.cursor = offset.min(self.rope.len_chars());
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn set_widget_attribute(&mut self, name: &str, value: &str) {
        self.widget.insert(name.to_string(), value.to_string());
    }

    pub fn remove_widget_attribute(&mut self, name: &str) {
        self.widget.remove(name);
    }

    /// Attribute currently set on the input element.
    pub fn input_attribute(&self, name: &str) -> Option<&str> {
        self.input_attributes.get(name).map(String::as_str)
    }

    pub fn input_attributes(&self) -> &BTreeMap<String, String> {
        &self.input_attributes
    }

    /// Attachments inserted so far, in order.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attached_menus(&self) -> usize {
        self.attached_menus
    }

    pub fn detached_menus(&self) -> &[MenuList] {
        &self.detached_menus
    }

    pub fn focus_count(&self) -> usize {
        self.focus_count
    }

    /// URLs frames were asked to load, in order.
    pub fn frame_requests(&self) -> &[Url] {
        &self.frame_requests
    }
}

impl InputElement for PlainHost {
    fn set_attribute(&mut self, name: &str, value: &str) {
        self.input_attributes.insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&mut self, name: &str) {
        self.input_attributes.remove(name);
    }

    fn focus(&mut self) {
        self.focused = true;
        self.focus_count += 1;
    }
}

impl EditorHost for PlainHost {
    type Menu = MenuList;
    type Widget = BTreeMap<String, String>;

    fn element_name(&self) -> &str {
        &self.element_name
    }

    fn widget(&self) -> &Self::Widget {
        &self.widget
    }

    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn caret_rect(&self, offset: usize) -> Option<CursorRect> {
        if offset > self.rope.len_chars() {
            return None;
        }
        let line = self.rope.char_to_line(offset);
        let column = offset - self.rope.line_to_char(line);
        Some(CursorRect::new(
            column as f64 * self.char_width,
            line as f64 * self.line_height,
            self.line_height,
        ))
    }

    fn replace_with_attachment(
        &mut self,
        range: Range<usize>,
        attachment: Attachment,
    ) -> Result<(), HostError> {
        if range.start > range.end || range.end > self.rope.len_chars() {
            return Err(HostError(format!(
                "range {}..{} outside document of {} chars",
                range.start,
                range.end,
                self.rope.len_chars()
            )));
        }
        self.rope.remove(range.clone());
        self.rope.insert_char(range.start, OBJECT_REPLACEMENT);
        self.cursor = range.start + 1;
        self.attachments.push(attachment);
        tracing::debug!(start = range.start, end = range.end, "inserted attachment");
        Ok(())
    }

    fn attach_menu(&mut self, menu: &mut MenuList) {
        menu.set_connected(true);
        self.attached_menus += 1;
    }

    fn detach_menu(&mut self, mut menu: MenuList) {
        menu.set_connected(false);
        self.detached_menus.push(menu);
    }

    fn find_frame(&self, id: &str) -> Option<FrameTarget> {
        self.frames.get(id).map(|(frame, _)| frame.clone())
    }

    fn load_frame(&mut self, frame: &FrameTarget, url: Url) -> LocalBoxFuture<Option<MenuList>> {
        tracing::debug!(frame = %frame.id, %url, "loading frame");
        self.frame_requests.push(url);
        let response = self
            .frames
            .get(&frame.id)
            .and_then(|(_, response)| response.clone());
        Box::pin(async move { response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_and_cursor() {
        let mut host = PlainHost::new("Hi ");
        assert_eq!(host.cursor(), 3);
        host.type_text("@ann");
        assert_eq!(host.text(), "Hi @ann");
        assert_eq!(host.cursor(), 7);
        host.set_cursor(100);
        assert_eq!(host.cursor(), 7);
    }

    #[test]
    fn test_caret_rect_on_grid() {
        let host = PlainHost::new("ab\ncdef");
        assert_eq!(host.caret_rect(1), Some(CursorRect::new(8.0, 0.0, 16.0)));
        assert_eq!(host.caret_rect(5), Some(CursorRect::new(16.0, 16.0, 16.0)));
        assert_eq!(host.caret_rect(8), None);
    }

    #[test]
    fn test_replace_with_attachment() {
        let mut host = PlainHost::new("Hi @an there");
        host.replace_with_attachment(3..6, Attachment::default()).unwrap();
        assert_eq!(host.text(), "Hi \u{FFFC} there");
        assert_eq!(host.cursor(), 4);
        assert_eq!(host.attachments().len(), 1);
    }

    #[test]
    fn test_replace_out_of_range() {
        let mut host = PlainHost::new("Hi");
        let err = host
            .replace_with_attachment(1..5, Attachment::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "range 1..5 outside document of 2 chars");
        assert_eq!(host.text(), "Hi");
    }

    #[test]
    fn test_unicode_offsets_are_chars() {
        let mut host = PlainHost::new("héllo @é");
        host.replace_with_attachment(6..8, Attachment::default()).unwrap();
        assert_eq!(host.text(), "héllo \u{FFFC}");
    }

    #[test]
    fn test_frame_load_records_url() {
        let frame = FrameTarget {
            id: "f".to_string(),
            src: None,
            base_uri: "https://example.com/".to_string(),
        };
        let mut host = PlainHost::new("").with_frame(frame.clone(), Some(MenuList::new()));
        let url = Url::parse("https://example.com/users?q=a").unwrap();
        let loaded = n0_future::future::block_on(host.load_frame(&frame, url.clone()));
        assert!(loaded.is_some());
        assert_eq!(host.frame_requests(), &[url]);
        assert!(host.find_frame("missing").is_none());
    }
}
