//! Trailing-edge debounce with an explicit task handle.
//!
//! At most one deferred task is outstanding per `Debouncer`. Scheduling a new
//! one replaces (cancels) the prior; a ticket for a replaced task no longer
//! fires. Time is passed in, so hosts drive it from whatever timer they have.

use web_time::{Duration, Instant};

/// Default debounce window for edit events.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

/// Handle for one scheduled debounce task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket {
    id: u64,
    deadline: Instant,
}

impl DebounceTicket {
    /// When the task becomes due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    next_id: u64,
    pending: Option<DebounceTicket>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_DELAY)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_id: 0,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule a task `delay` after `now`, replacing any pending one.
    pub fn schedule(&mut self, now: Instant) -> DebounceTicket {
        self.next_id += 1;
        let ticket = DebounceTicket {
            id: self.next_id,
            deadline: now + self.delay,
        };
        self.pending = Some(ticket);
        ticket
    }

    /// Cancel the pending task. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Claim the pending task if `ticket` is still current.
    pub fn take(&mut self, ticket: DebounceTicket) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Claim the pending task if it is due at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<DebounceTicket> {
        match self.pending {
            Some(ticket) if ticket.deadline <= now => {
                self.pending = None;
                Some(ticket)
            }
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<DebounceTicket> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_replaces_pending() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let now = Instant::now();

        let first = debouncer.schedule(now);
        let second = debouncer.schedule(now + Duration::from_millis(50));

        assert!(!debouncer.take(first));
        assert!(debouncer.take(second));
        assert!(debouncer.pending().is_none());
    }

    #[test]
    fn test_ticket_fires_once() {
        let mut debouncer = Debouncer::default();
        let ticket = debouncer.schedule(Instant::now());
        assert!(debouncer.take(ticket));
        assert!(!debouncer.take(ticket));
    }

    #[test]
    fn test_take_due() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let now = Instant::now();
        let ticket = debouncer.schedule(now);

        assert_eq!(debouncer.take_due(now + Duration::from_millis(99)), None);
        assert_eq!(
            debouncer.take_due(now + Duration::from_millis(100)),
            Some(ticket)
        );
        assert_eq!(debouncer.take_due(now + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_deadline_extends_with_each_schedule() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        let now = Instant::now();
        debouncer.schedule(now);
        let later = debouncer.schedule(now + Duration::from_millis(200));
        assert_eq!(later.deadline(), now + Duration::from_millis(500));
    }

    #[test]
    fn test_cancel() {
        let mut debouncer = Debouncer::default();
        let ticket = debouncer.schedule(Instant::now());
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        assert!(!debouncer.take(ticket));
    }
}
