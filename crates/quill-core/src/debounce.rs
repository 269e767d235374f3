//! Timer-reset-on-push debouncer.
//!
//! Holds at most one pending value and one deadline. Every push replaces the
//! value and moves the deadline to `now + delay`.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace the pending value and restart the quiescence window.
    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.delay));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Drop the pending value without settling it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// Take the pending value if its window has elapsed at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if deadline <= now => self.cancel(),
            _ => None,
        }
    }

    /// Wait until the pending value settles and return it.
    ///
    /// Never resolves while nothing is pending. Cancel safe: dropping the
    /// future before it resolves leaves the pending value in place, so it can
    /// sit in a `select!` next to the channel feeding [`push`](Self::push).
    pub async fn settled(&mut self) -> T {
        loop {
            let Some(deadline) = self.deadline() else {
                return std::future::pending().await;
            };
            sleep_until(deadline).await;
            if let Some(value) = self.take_due(Instant::now()) {
                return value;
            }
        }
    }
}
