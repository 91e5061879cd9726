use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Identifies one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Shared cancellation flag. Cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A timer that fires at most once, at or after its deadline.
#[derive(Debug, Clone)]
pub struct OneShot {
    token: TimerToken,
    due_ns: u64,
    cancel: CancelToken,
    fired: bool,
}

impl OneShot {
    pub fn schedule(token: TimerToken, now_ns: u64, delay: Duration, cancel: CancelToken) -> Self {
        Self {
            token,
            due_ns: now_ns.saturating_add(delay.as_nanos() as u64),
            cancel,
            fired: false,
        }
    }

    pub fn token(&self) -> TimerToken {
        self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns the token the first time it is polled at or past the
    /// deadline. Cancelled or already fired timers return `None`.
    pub fn poll(&mut self, now_ns: u64) -> Option<TimerToken> {
        if self.fired || self.cancel.is_cancelled() || now_ns < self.due_ns {
            return None;
        }
        self.fired = true;
        Some(self.token)
    }

    /// Time left until the deadline, zero once due.
    pub fn remaining(&self, now_ns: u64) -> Duration {
        Duration::from_nanos(self.due_ns.saturating_sub(now_ns))
    }
}
