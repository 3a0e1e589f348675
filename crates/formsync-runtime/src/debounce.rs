#![forbid(unsafe_code)]

//! Trailing-edge debouncer driven by caller-supplied time.
//!
//! Each [`push`](Debouncer::push) replaces the pending value and restarts the
//! quiet period. [`poll`](Debouncer::poll) releases the latest value once the
//! window has elapsed since the last push. Time never advances on its own, so
//! the event loop (or a test) decides when to poll.
//!
//! # Invariants
//!
//! 1. At most one value is pending; later pushes overwrite earlier ones.
//! 2. A value is released at most once.
//! 3. `poll` before the deadline returns `None` and keeps the value.
//! 4. `cancel` discards the pending value without releasing it.

use std::time::Duration;

use web_time::Instant;

#[derive(Debug)]
struct Pending<T> {
    value: T,
    last_change: Instant,
    coalesced: u32,
}

/// A value released by [`Debouncer::poll`] or [`Debouncer::flush`].
#[derive(Clone, Debug, PartialEq)]
pub struct Settled<T> {
    pub value: T,
    /// How many pushes were folded into this value.
    pub coalesced: u32,
}

/// Trailing-edge debouncer.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a change at `now`, replacing any pending value.
    pub fn push(&mut self, value: T, now: Instant) {
        let coalesced = self.pending.as_ref().map_or(0, |p| p.coalesced) + 1;
        tracing::trace!(coalesced, window_ms = self.window.as_millis() as u64, "debounce restart");
        self.pending = Some(Pending {
            value,
            last_change: now,
            coalesced,
        });
    }

    /// Release the pending value if the window has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<Settled<T>> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|p| now.saturating_duration_since(p.last_change) >= self.window);
        if due { self.flush() } else { None }
    }

    /// Release the pending value immediately.
    pub fn flush(&mut self) -> Option<Settled<T>> {
        self.pending.take().map(|p| Settled {
            value: p.value,
            coalesced: p.coalesced,
        })
    }

    /// Drop the pending value. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value will settle, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.last_change + self.window)
    }
}
