//! Keyboard and pointer selection over a popup list.
//!
//! The combobox tracks one selected option among the visible options of a
//! `Listbox`, mirrors it into the input's `aria-activedescendant`, and reports
//! commits. It never wraps: moving past either end clears the selection and
//! hands focus back to the input.

use std::sync::atomic::{AtomicUsize, Ordering};

use smol_str::{SmolStr, format_smolstr};

use crate::host::InputElement;
use crate::keys::{Key, KeyEvent};
use crate::listbox::{ListOption, Listbox};

static NEXT_LIST_ID: AtomicUsize = AtomicUsize::new(1);

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Outcome of a keydown routed through the combobox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboboxKey {
    /// Not a combobox key, let the event continue.
    NotHandled,
    /// Consumed (prevent default), nothing to commit.
    Handled,
    /// Commit the option at this index (prevent default).
    Commit(usize),
}

#[derive(Debug, Clone)]
pub struct Combobox {
    list_id: SmolStr,
    composing: bool,
    started: bool,
    ctrl_bindings: bool,
}

impl Combobox {
    /// Link `input` to `list`, assigning the list an id if it has none.
    pub fn new<I, L>(input: &mut I, list: &mut L, ctrl_bindings: bool) -> Self
    where
        I: InputElement + ?Sized,
        L: Listbox + ?Sized,
    {
        let list_id = match list.id() {
            Some(id) => id,
            None => {
                let id = format_smolstr!("combobox-{}", NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed));
                list.set_id(id.clone());
                id
            }
        };

        input.set_attribute("role", "combobox");
        input.set_attribute("aria-controls", &list_id);
        input.set_attribute("aria-expanded", "false");
        input.set_attribute("aria-autocomplete", "list");
        input.set_attribute("aria-haspopup", "listbox");

        Self {
            list_id,
            composing: false,
            started: false,
            ctrl_bindings,
        }
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Begin handling keyboard and pointer input for the list.
    pub fn start<I: InputElement + ?Sized>(&mut self, input: &mut I) {
        input.set_attribute("aria-expanded", "true");
        self.started = true;
    }

    /// Stop handling input and clear the selection.
    pub fn stop<I, L>(&mut self, input: &mut I, list: &mut L)
    where
        I: InputElement + ?Sized,
        L: Listbox + ?Sized,
    {
        self.clear_selection(input, list);
        input.set_attribute("aria-expanded", "false");
        self.started = false;
        self.composing = false;
    }

    /// Stop and remove every attribute `new` added to the input.
    pub fn destroy<I, L>(&mut self, input: &mut I, list: &mut L)
    where
        I: InputElement + ?Sized,
        L: Listbox + ?Sized,
    {
        self.clear_selection(input, list);
        self.stop(input, list);
        input.remove_attribute("role");
        input.remove_attribute("aria-controls");
        input.remove_attribute("aria-expanded");
        input.remove_attribute("aria-autocomplete");
        input.remove_attribute("aria-haspopup");
    }

    /// Move the selection to the next or previous visible option.
    pub fn navigate<I, L>(&mut self, input: &mut I, list: &mut L, direction: Direction)
    where
        I: InputElement + ?Sized,
        L: Listbox + ?Sized,
    {
        let options = list.options();
        let visible: Vec<usize> = options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.is_visible())
            .map(|(index, _)| index)
            .collect();
        let focus = visible.iter().position(|&index| options[index].selected);

        let at_end = match (focus, direction) {
            (Some(pos), Direction::Next) => pos + 1 == visible.len(),
            (Some(pos), Direction::Previous) => pos == 0,
            (None, Direction::Next) => visible.is_empty(),
            (None, Direction::Previous) => false,
        };
        if at_end {
            self.clear_selection(input, list);
            input.focus();
            return;
        }

        let target_pos = match (focus, direction) {
            (Some(pos), Direction::Next) => pos + 1,
            (Some(pos), Direction::Previous) => pos - 1,
            (None, Direction::Next) => 0,
            (None, Direction::Previous) => match visible.len().checked_sub(1) {
                Some(last) => last,
                None => return,
            },
        };
        let target = visible[target_pos];

        for &index in &visible {
            if index == target {
                match &options[index].id {
                    Some(id) => input.set_attribute("aria-activedescendant", id),
                    None => input.remove_attribute("aria-activedescendant"),
                }
                list.set_selected(index, true);
                scroll_into_view(list, &options[index]);
            } else {
                list.set_selected(index, false);
            }
        }
        tracing::trace!(index = target, list = %self.list_id, "combobox selection moved");
    }

    /// Unmark the selected option and drop the active-descendant link.
    pub fn clear_selection<I, L>(&mut self, input: &mut I, list: &mut L)
    where
        I: InputElement + ?Sized,
        L: Listbox + ?Sized,
    {
        input.remove_attribute("aria-activedescendant");
        for (index, option) in list.options().iter().enumerate() {
            if option.selected {
                list.set_selected(index, false);
            }
        }
    }

    /// Track IME composition; selection is cleared on either edge.
    pub fn set_composing<I, L>(&mut self, input: &mut I, list: &mut L, composing: bool)
    where
        I: InputElement + ?Sized,
        L: Listbox + ?Sized,
    {
        if !self.started {
            return;
        }
        self.composing = composing;
        self.clear_selection(input, list);
    }

    /// The query text changed; the old selection no longer applies.
    pub fn on_input<I, L>(&mut self, input: &mut I, list: &mut L)
    where
        I: InputElement + ?Sized,
        L: Listbox + ?Sized,
    {
        if self.started {
            self.clear_selection(input, list);
        }
    }

    pub fn on_keydown<I, L>(&mut self, input: &mut I, list: &mut L, event: &KeyEvent) -> ComboboxKey
    where
        I: InputElement + ?Sized,
        L: Listbox + ?Sized,
    {
        let modifiers = event.modifiers;
        if !self.started || modifiers.has_non_ctrl() {
            return ComboboxKey::NotHandled;
        }
        if !self.ctrl_bindings && modifiers.ctrl {
            return ComboboxKey::NotHandled;
        }
        if self.composing {
            return ComboboxKey::NotHandled;
        }

        match &event.key {
            Key::Enter | Key::Tab => commit(list),
            Key::Escape => {
                self.clear_selection(input, list);
                ComboboxKey::NotHandled
            }
            Key::ArrowDown => {
                self.navigate(input, list, Direction::Next);
                ComboboxKey::Handled
            }
            Key::ArrowUp => {
                self.navigate(input, list, Direction::Previous);
                ComboboxKey::Handled
            }
            Key::Character(c) if c == "n" || c == "p" => {
                if self.ctrl_bindings && modifiers.ctrl {
                    let direction = if c == "n" {
                        Direction::Next
                    } else {
                        Direction::Previous
                    };
                    self.navigate(input, list, direction);
                    ComboboxKey::Handled
                } else {
                    ComboboxKey::NotHandled
                }
            }
            _ => {
                if !modifiers.ctrl && !event.key.is_modifier() {
                    self.clear_selection(input, list);
                }
                ComboboxKey::NotHandled
            }
        }
    }

    /// Pointer activation of the option at `index`.
    ///
    /// Disabled options swallow the click and commit nothing.
    pub fn on_click<L: Listbox + ?Sized>(&self, list: &L, index: usize) -> Option<usize> {
        if !self.started {
            return None;
        }
        let option = list.options().into_iter().nth(index)?;
        if option.disabled {
            tracing::trace!(index, "click on disabled option ignored");
            return None;
        }
        Some(index)
    }
}

/// Commit the selected option, if any.
fn commit<L: Listbox + ?Sized>(list: &L) -> ComboboxKey {
    let options = list.options();
    let Some(index) = options.iter().position(|o| o.selected) else {
        return ComboboxKey::NotHandled;
    };
    if options[index].disabled {
        return ComboboxKey::Handled;
    }
    ComboboxKey::Commit(index)
}

fn scroll_into_view<L: Listbox + ?Sized>(list: &mut L, option: &ListOption) {
    let scroll_top = list.scroll_top();
    let container_bottom = scroll_top + list.client_height();
    let top = option.offset_top;
    let bottom = top + option.height;
    if top < scroll_top || bottom > container_bottom {
        list.set_scroll_top(top);
    }
}
