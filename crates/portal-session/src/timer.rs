use std::time::Duration;
use tokio::time::Instant;

/// The single pending inactivity deadline owned by a session guard.
///
/// Holding the deadline in one `Option` is what keeps at most one timer alive:
/// `start` and `reset` overwrite it, `cancel` clears it.
#[derive(Debug, Clone)]
pub struct InactivityTimer {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl InactivityTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Schedules the deadline at `now + timeout`, replacing any pending one.
    pub fn start(&mut self, now: Instant) -> Instant {
        let deadline = now + self.timeout;
        self.deadline = Some(deadline);
        deadline
    }

    /// Cancels the pending deadline and schedules a fresh one from `now`.
    ///
    /// The reset is absolute: the new deadline does not depend on how much of
    /// the previous window was left.
    pub fn reset(&mut self, now: Instant) -> Instant {
        self.cancel();
        self.start(now)
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn has_expired(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }
}
