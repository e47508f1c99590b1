//! Listener plumbing for the two extension points: candidate lookup and commit.
//!
//! Listeners run synchronously in registration order. Any listener may veto
//! the default behavior; every listener still sees the event.

use std::future::Future;
use std::pin::Pin;

use smol_str::SmolStr;

use crate::attachment::{Attachment, AttachmentOptions};
use crate::listbox::ElementData;

/// Boxed future without a `Send` bound; providers often hold host handles.
pub type LocalBoxFuture<T> = Pin<Box<dyn Future<Output = T> + 'static>>;

/// What a listener decided about the default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Proceed,
    /// Suppress the default action.
    Veto,
}

/// A provider's answer to a candidate request.
#[derive(Debug, Clone)]
pub struct Candidates<M> {
    pub matched: bool,
    pub fragment: Option<M>,
}

impl<M> Candidates<M> {
    pub fn matched(fragment: M) -> Self {
        Self {
            matched: true,
            fragment: Some(fragment),
        }
    }

    pub fn unmatched() -> Self {
        Self {
            matched: false,
            fragment: None,
        }
    }
}

/// A provider failed to produce candidates.
#[derive(Debug, Clone, thiserror::Error)]
#[error("candidate provider failed: {0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type CandidateFuture<M> = LocalBoxFuture<Result<Candidates<M>, ProviderError>>;

/// Request for candidates matching the current query.
pub struct CandidatesNeeded<M> {
    text: String,
    key: SmolStr,
    provided: Vec<CandidateFuture<M>>,
}

impl<M> CandidatesNeeded<M> {
    pub(crate) fn new(text: impl Into<String>, key: SmolStr) -> Self {
        Self {
            text: text.into(),
            key,
            provided: Vec::new(),
        }
    }

    /// The query text typed after the trigger key.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The trigger key that started the query.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Hand back a (possibly deferred) candidate result.
    pub fn provide<F>(&mut self, candidates: F)
    where
        F: Future<Output = Result<Candidates<M>, ProviderError>> + 'static,
    {
        self.provided.push(Box::pin(candidates));
    }

    pub(crate) fn into_provided(self) -> Vec<CandidateFuture<M>> {
        self.provided
    }
}

pub trait CandidateListener<M> {
    fn candidates_needed(&mut self, event: &mut CandidatesNeeded<M>) -> Verdict;
}

impl<M, F> CandidateListener<M> for F
where
    F: FnMut(&mut CandidatesNeeded<M>) -> Verdict,
{
    fn candidates_needed(&mut self, event: &mut CandidatesNeeded<M>) -> Verdict {
        self(event)
    }
}

/// An option was chosen from the popup.
#[derive(Debug, Clone)]
pub struct CommitEvent {
    item: ElementData,
    index: usize,
    key: SmolStr,
    value: Option<AttachmentOptions>,
}

impl CommitEvent {
    pub(crate) fn new(item: ElementData, index: usize, key: SmolStr) -> Self {
        Self {
            item,
            index,
            key,
            value: None,
        }
    }

    /// The committed option element.
    pub fn item(&self) -> &ElementData {
        &self.item
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&AttachmentOptions> {
        self.value.as_ref()
    }

    /// Replace the attachment options derived from the element.
    pub fn set_value(&mut self, value: AttachmentOptions) {
        self.value = Some(value);
    }

    /// The attachment to insert: the substituted value if a listener set one.
    pub fn into_attachment(self) -> Attachment {
        match self.value {
            Some(value) => Attachment::from_options(value),
            None => Attachment::from_element(&self.item),
        }
    }
}

pub trait CommitListener {
    fn commit(&mut self, event: &mut CommitEvent) -> Verdict;
}

impl<F> CommitListener for F
where
    F: FnMut(&mut CommitEvent) -> Verdict,
{
    fn commit(&mut self, event: &mut CommitEvent) -> Verdict {
        self(event)
    }
}

pub(crate) fn dispatch_candidates<M>(
    listeners: &mut [Box<dyn CandidateListener<M>>],
    event: &mut CandidatesNeeded<M>,
) -> Verdict {
    let mut verdict = Verdict::Proceed;
    for listener in listeners.iter_mut() {
        if listener.candidates_needed(event) == Verdict::Veto {
            verdict = Verdict::Veto;
        }
    }
    verdict
}

pub(crate) fn dispatch_commit(
    listeners: &mut [Box<dyn CommitListener>],
    event: &mut CommitEvent,
) -> Verdict {
    let mut verdict = Verdict::Proceed;
    for listener in listeners.iter_mut() {
        if listener.commit(event) == Verdict::Veto {
            verdict = Verdict::Veto;
        }
    }
    verdict
}
