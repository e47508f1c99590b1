//! The mention interaction state machine.
//!
//! `MentionExpander` is driven entirely by the host: edit, key, focus and
//! pointer events go in through the `on_*` methods, the host's timer fires the
//! returned `DebounceTicket`, and the host awaits each `ProviderCycle` and
//! feeds the outcome back through `complete_cycle`. Nothing is borrowed across
//! an await, so the host keeps full control of the editor in between.
//!
//! ```text
//! Idle --edit--> Debouncing --timer--> AwaitingProviders --fragment--> PopupActive
//!   ^                             |                |                       |
//!   +------- no match ------------+---- veto/none -+---- escape/blur/commit+
//! ```

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use smol_str::format_smolstr;
use web_time::Instant;

use crate::combobox::{Combobox, ComboboxKey, Direction};
use crate::config::{ExpanderOptions, MentionsConfig};
use crate::debounce::{DebounceTicket, Debouncer};
use crate::error::MentionsError;
use crate::events::{
    CandidateListener, CandidatesNeeded, CommitEvent, CommitListener, LocalBoxFuture, Verdict,
    dispatch_candidates, dispatch_commit,
};
use crate::frame::frame_url;
use crate::host::EditorHost;
use crate::keys::{Key, KeyEvent, KeydownResult};
use crate::listbox::Listbox;
use crate::query::{QueryOptions, query};
use crate::types::Match;


static NEXT_MENU_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one provider round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CycleId(u64);

/// Observable interaction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// An edit is waiting for the debounce timer; no popup is showing.
    Debouncing,
    AwaitingProviders,
    PopupActive,
}

/// What `complete_cycle` did with a provider outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleResolution {
    /// The popup is showing the fragment.
    Activated,
    /// No fragment; any open popup was closed.
    Closed,
    /// The editor lost focus meanwhile; nothing is shown.
    Refused,
    /// A newer cycle or a dismissal superseded this one.
    Stale,
}

/// A pending provider round-trip for one match.
///
/// Await `settle` and pass the outcome to `MentionExpander::complete_cycle`.
pub struct ProviderCycle<M> {
    cycle: CycleId,
    pending: LocalBoxFuture<Option<M>>,
}

impl<M> ProviderCycle<M> {
    pub fn id(&self) -> CycleId {
        self.cycle
    }

    /// Wait for every provider to settle.
    pub async fn settle(self) -> CycleOutcome<M> {
        let fragment = self.pending.await;
        CycleOutcome {
            cycle: self.cycle,
            fragment,
        }
    }
}

/// Result of a settled `ProviderCycle`.
pub struct CycleOutcome<M> {
    pub cycle: CycleId,
    /// The first matched fragment, if any.
    pub fragment: Option<M>,
}

struct ActivePopup<M> {
    menu: M,
    /// The menu was already in the host tree; hide it rather than detach.
    was_connected: bool,
    combobox: Combobox,
}

enum InteractionState<M> {
    Idle,
    AwaitingProviders {
        cycle: CycleId,
        matched: Match,
        /// Popup from an earlier cycle, still interactive until replaced.
        open: Option<ActivePopup<M>>,
    },
    PopupActive {
        matched: Match,
        popup: ActivePopup<M>,
    },
}

/// Mention autocomplete bound to one host editor.
pub struct MentionExpander<H: EditorHost> {
    host: H,
    options: ExpanderOptions,
    state: InteractionState<H::Menu>,
    debounce: Debouncer,
    candidate_listeners: Vec<Box<dyn CandidateListener<H::Menu>>>,
    commit_listeners: Vec<Box<dyn CommitListener>>,
    look_back_index: usize,
    just_pasted: bool,
    composing: bool,
    interacting_with_list: bool,
    next_cycle: u64,
}

impl<H: EditorHost> MentionExpander<H> {
    /// Bind to `host`, which must be the configured editor element.
    pub fn new(host: H, options: ExpanderOptions) -> Result<Self, MentionsError> {
        if host.element_name() != options.editor_element {
            return Err(MentionsError::UnsupportedEditor {
                expected: options.editor_element.clone(),
                found: host.element_name().to_string(),
            });
        }
        Ok(Self {
            host,
            debounce: Debouncer::new(options.debounce()),
            options,
            state: InteractionState::Idle,
            candidate_listeners: Vec::new(),
            commit_listeners: Vec::new(),
            look_back_index: 0,
            just_pasted: false,
            composing: false,
            interacting_with_list: false,
            next_cycle: 0,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Tear down any popup and give the host back.
    pub fn into_host(mut self) -> H {
        self.destroy();
        self.host
    }

    pub fn options(&self) -> &ExpanderOptions {
        &self.options
    }

    pub fn add_candidate_listener<L>(&mut self, listener: L)
    where
        L: CandidateListener<H::Menu> + 'static,
    {
        self.candidate_listeners.push(Box::new(listener));
    }

    pub fn add_commit_listener<L>(&mut self, listener: L)
    where
        L: CommitListener + 'static,
    {
        self.commit_listeners.push(Box::new(listener));
    }

    pub fn phase(&self) -> Phase {
        match &self.state {
            InteractionState::PopupActive { .. } => Phase::PopupActive,
            InteractionState::AwaitingProviders { .. } => Phase::AwaitingProviders,
            InteractionState::Idle if self.debounce.pending().is_some() => Phase::Debouncing,
            InteractionState::Idle => Phase::Idle,
        }
    }

    /// The match being completed, if any.
    pub fn current_match(&self) -> Option<&Match> {
        match &self.state {
            InteractionState::Idle => None,
            InteractionState::AwaitingProviders { matched, .. } => Some(matched),
            InteractionState::PopupActive { matched, .. } => Some(matched),
        }
    }

    pub fn look_back_index(&self) -> usize {
        self.look_back_index
    }

    /// When the pending debounce task is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.pending().map(|ticket| ticket.deadline())
    }

    /// The menu of the open popup.
    pub fn menu(&self) -> Option<&H::Menu> {
        match &self.state {
            InteractionState::PopupActive { popup, .. } => Some(&popup.menu),
            InteractionState::AwaitingProviders {
                open: Some(popup), ..
            } => Some(&popup.menu),
            _ => None,
        }
    }

    /// The document changed. Returns the debounce task to fire, if one was
    /// scheduled.
    pub fn on_input(&mut self, now: Instant) -> Option<DebounceTicket> {
        self.with_popup(|host, popup| popup.combobox.on_input(host, &mut popup.menu));
        if self.composing {
            return None;
        }
        if self.just_pasted {
            tracing::trace!("swallowing input after paste");
            self.just_pasted = false;
            return None;
        }
        Some(self.debounce.schedule(now))
    }

    /// The next input event is a paste and is not evaluated.
    pub fn on_paste(&mut self) {
        self.just_pasted = true;
    }

    pub fn on_composition_start(&mut self) {
        self.composing = true;
        self.with_popup(|host, popup| popup.combobox.set_composing(host, &mut popup.menu, true));
    }

    /// Composition committed text; evaluate it like a normal edit.
    pub fn on_composition_end(&mut self, now: Instant) -> Option<DebounceTicket> {
        self.composing = false;
        self.with_popup(|host, popup| popup.combobox.set_composing(host, &mut popup.menu, false));
        Some(self.debounce.schedule(now))
    }

    /// Run the debounce task for `ticket` if it is still the pending one.
    pub fn fire_debounce(&mut self, ticket: DebounceTicket) -> Option<ProviderCycle<H::Menu>> {
        if !self.debounce.take(ticket) {
            tracing::trace!("debounce ticket superseded");
            return None;
        }
        self.evaluate()
    }

    /// Run the pending debounce task if it is due at `now`.
    pub fn poll_debounce(&mut self, now: Instant) -> Option<ProviderCycle<H::Menu>> {
        self.debounce.take_due(now)?;
        self.evaluate()
    }

    /// Apply a settled provider cycle.
    pub fn complete_cycle(&mut self, outcome: CycleOutcome<H::Menu>) -> CycleResolution {
        let current = matches!(
            &self.state,
            InteractionState::AwaitingProviders { cycle, .. } if *cycle == outcome.cycle
        );
        if !current {
            tracing::debug!(cycle = outcome.cycle.0, "discarding stale provider result");
            return CycleResolution::Stale;
        }
        let InteractionState::AwaitingProviders { matched, open, .. } =
            mem::replace(&mut self.state, InteractionState::Idle)
        else {
            return CycleResolution::Stale;
        };

        match outcome.fragment {
            Some(menu) => self.activate(matched, open, menu),
            None => {
                if let Some(popup) = open {
                    self.close_popup(popup);
                }
                CycleResolution::Closed
            }
        }
    }

    pub fn on_keydown(&mut self, event: &KeyEvent) -> Result<KeydownResult, MentionsError> {
        let routed =
            self.with_popup(|host, popup| popup.combobox.on_keydown(host, &mut popup.menu, event));
        match routed {
            Some(ComboboxKey::Commit(index)) => {
                self.commit(index)?;
                return Ok(KeydownResult::Handled);
            }
            Some(ComboboxKey::Handled) => return Ok(KeydownResult::Handled),
            _ => {}
        }

        if event.key == Key::Escape && self.reset() {
            self.advance_look_back();
            tracing::debug!(look_back = self.look_back_index, "popup dismissed");
            return Ok(KeydownResult::Handled);
        }
        Ok(KeydownResult::NotHandled)
    }

    /// A pointer went down on the menu; the blur it causes is ignored.
    pub fn on_menu_pointer_down(&mut self) {
        self.interacting_with_list = true;
    }

    /// Pointer activation of the option at `index`. Returns whether a commit
    /// happened.
    pub fn on_menu_click(&mut self, index: usize) -> Result<bool, MentionsError> {
        let target = self
            .with_popup(|_, popup| popup.combobox.on_click(&popup.menu, index))
            .flatten();
        match target {
            Some(index) => self.commit(index),
            None => Ok(false),
        }
    }

    pub fn on_blur(&mut self) {
        if self.interacting_with_list {
            self.interacting_with_list = false;
            return;
        }
        self.deactivate();
    }

    /// Close the popup from outside, advancing the look-back index past the
    /// cursor. Returns whether a popup was open.
    pub fn dismiss(&mut self) -> bool {
        if !self.deactivate() {
            return false;
        }
        self.advance_look_back();
        true
    }

    /// Skip past a dismissed trigger so it does not match again.
    fn advance_look_back(&mut self) {
        let cursor = self.host.cursor();
        if cursor > 0 {
            self.look_back_index = cursor;
        }
    }

    /// Cancel pending work and close any popup.
    pub fn destroy(&mut self) {
        self.debounce.cancel();
        self.reset();
    }

    fn next_cycle_id(&mut self) -> CycleId {
        self.next_cycle += 1;
        CycleId(self.next_cycle)
    }

    fn evaluate(&mut self) -> Option<ProviderCycle<H::Menu>> {
        let Some(matched) = self.find_match() else {
            tracing::trace!("no query under cursor");
            self.reset();
            return None;
        };

        let cycle = self.next_cycle_id();
        let open = match mem::replace(&mut self.state, InteractionState::Idle) {
            InteractionState::Idle => None,
            InteractionState::AwaitingProviders { open, .. } => open,
            InteractionState::PopupActive { popup, .. } => Some(popup),
        };
        tracing::debug!(
            cycle = cycle.0,
            key = %matched.key,
            text = %matched.text,
            position = matched.position,
            "query matched"
        );
        self.state = InteractionState::AwaitingProviders {
            cycle,
            matched: matched.clone(),
            open,
        };

        let pending = self.notify_providers(&matched);
        Some(ProviderCycle { cycle, pending })
    }

    /// Sample the document and try each trigger key in order.
    fn find_match(&mut self) -> Option<Match> {
        let document = self.host.text();
        let text = document.trim_end_matches('\n');
        let cursor = self.host.cursor();
        if cursor < self.look_back_index {
            self.look_back_index = cursor.saturating_sub(1);
        }

        let config = MentionsConfig::from_attributes(self.host.widget());
        let last_match_position = self.current_match().map(|m| m.position);
        config.keys.iter().find_map(|key| {
            let options = QueryOptions {
                multi_word: key.multi_word,
                look_back_index: self.look_back_index,
                last_match_position,
            };
            query(text, &key.key, cursor, options)
                .map(|found| Match::new(found.text, key.key.clone(), found.position))
        })
    }

    fn notify_providers(&mut self, matched: &Match) -> LocalBoxFuture<Option<H::Menu>> {
        let mut event = CandidatesNeeded::new(matched.text.clone(), matched.key.clone());
        if dispatch_candidates(&mut self.candidate_listeners, &mut event) == Verdict::Veto {
            tracing::debug!("candidate request vetoed");
            return Box::pin(async { None });
        }

        let provided = event.into_provided();
        if provided.is_empty() {
            return self.load_fallback_frame(&matched.text);
        }

        Box::pin(async move {
            let mut candidates = Vec::new();
            for result in n0_future::join_all(provided).await {
                match result {
                    Ok(c) => candidates.push(c),
                    Err(e) => tracing::warn!(error = %e, "candidate provider failed"),
                }
            }
            candidates
                .into_iter()
                .find(|c| c.matched)
                .and_then(|c| c.fragment)
        })
    }

    fn load_fallback_frame(&mut self, text: &str) -> LocalBoxFuture<Option<H::Menu>> {
        let config = MentionsConfig::from_attributes(self.host.widget());
        let (Some(name), Some(frame_id)) = (
            config.name.as_deref().filter(|name| !name.is_empty()),
            config.frame_id.as_deref(),
        )
        else {
            return Box::pin(async { None });
        };
        let Some(frame) = self.host.find_frame(frame_id) else {
            tracing::debug!(frame = frame_id, "fallback frame not found");
            return Box::pin(async { None });
        };
        let url = match frame_url(config.src.as_deref(), &frame, name, text) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, frame = frame_id, "invalid fallback frame url");
                return Box::pin(async { None });
            }
        };

        let load = self.host.load_frame(&frame, url);
        Box::pin(async move { load.await.filter(|menu| !menu.is_empty()) })
    }

    fn activate(
        &mut self,
        matched: Match,
        open: Option<ActivePopup<H::Menu>>,
        mut menu: H::Menu,
    ) -> CycleResolution {
        if let Some(popup) = open {
            self.close_popup(popup);
        }
        if !self.host.is_focused() {
            tracing::debug!("editor not focused, not showing popup");
            return CycleResolution::Refused;
        }

        let was_connected = menu.is_connected();
        if menu.id().is_none() {
            let id = NEXT_MENU_ID.fetch_add(1, Ordering::Relaxed);
            menu.set_id(format_smolstr!("{}-{}", self.options.menu_id_prefix, id));
        }
        if was_connected {
            menu.set_hidden(false);
        } else {
            self.host.attach_menu(&mut menu);
        }

        let mut combobox = Combobox::new(&mut self.host, &mut menu, self.options.ctrl_bindings);
        self.host.set_attribute("role", "combobox");
        self.host.set_attribute("aria-multiline", "false");

        let anchor = matched.position.saturating_sub(1);
        if let Some(rect) = self.host.caret_rect(anchor) {
            menu.set_position(rect.bottom(), rect.x);
        }

        combobox.start(&mut self.host);
        combobox.navigate(&mut self.host, &mut menu, Direction::Next);

        tracing::debug!(menu = ?menu.id(), was_connected, "popup activated");
        self.state = InteractionState::PopupActive {
            matched,
            popup: ActivePopup {
                menu,
                was_connected,
                combobox,
            },
        };
        CycleResolution::Activated
    }

    fn close_popup(&mut self, popup: ActivePopup<H::Menu>) {
        let ActivePopup {
            mut menu,
            was_connected,
            mut combobox,
        } = popup;
        combobox.destroy(&mut self.host, &mut menu);
        self.interacting_with_list = false;
        self.host.remove_attribute("aria-multiline");
        self.host.set_attribute("role", "textbox");
        if was_connected {
            menu.set_hidden(true);
        } else {
            self.host.detach_menu(menu);
        }
    }

    /// Close the popup but keep an in-flight cycle alive.
    fn deactivate(&mut self) -> bool {
        match mem::replace(&mut self.state, InteractionState::Idle) {
            InteractionState::Idle => false,
            InteractionState::AwaitingProviders {
                cycle,
                matched,
                open,
            } => {
                self.state = InteractionState::AwaitingProviders {
                    cycle,
                    matched,
                    open: None,
                };
                match open {
                    Some(popup) => {
                        self.close_popup(popup);
                        true
                    }
                    None => false,
                }
            }
            InteractionState::PopupActive { popup, .. } => {
                self.close_popup(popup);
                true
            }
        }
    }

    /// Drop the match and close any popup. Returns whether a popup closed.
    fn reset(&mut self) -> bool {
        match mem::replace(&mut self.state, InteractionState::Idle) {
            InteractionState::Idle => false,
            InteractionState::AwaitingProviders { open, .. } => match open {
                Some(popup) => {
                    self.close_popup(popup);
                    true
                }
                None => false,
            },
            InteractionState::PopupActive { popup, .. } => {
                self.close_popup(popup);
                true
            }
        }
    }

    fn commit(&mut self, index: usize) -> Result<bool, MentionsError> {
        let (matched, popup) = match &self.state {
            InteractionState::PopupActive { matched, popup } => (matched, popup),
            InteractionState::AwaitingProviders {
                matched,
                open: Some(popup),
                ..
            } => (matched, popup),
            _ => return Ok(false),
        };
        let Some(item) = popup.menu.element(index) else {
            return Ok(false);
        };
        let range = matched.range();
        let mut event = CommitEvent::new(item, index, matched.key.clone());

        if dispatch_commit(&mut self.commit_listeners, &mut event) == Verdict::Veto {
            tracing::debug!(index, "commit vetoed");
            return Ok(false);
        }

        let attachment = event.into_attachment();
        self.host.replace_with_attachment(range.clone(), attachment)?;
        let cursor = self.host.cursor();
        self.reset();
        self.host.focus();
        self.look_back_index = cursor;
        tracing::debug!(start = range.start, end = range.end, cursor, "mention committed");
        Ok(true)
    }

    fn with_popup<R>(
        &mut self,
        f: impl FnOnce(&mut H, &mut ActivePopup<H::Menu>) -> R,
    ) -> Option<R> {
        let popup = match &mut self.state {
            InteractionState::PopupActive { popup, .. } => popup,
            InteractionState::AwaitingProviders {
                open: Some(popup), ..
            } => popup,
            _ => return None,
        };
        Some(f(&mut self.host, popup))
    }
}
