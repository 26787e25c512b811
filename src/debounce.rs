//! Debounce Module
//!
//! Holds back a rapidly changing value until it has been stable for a
//! fixed delay. Only the latest value of a burst is ever published.

use std::time::Duration;

use tracing::trace;

use crate::clock::SharedClock;

/// Default delay for search inputs.
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline_ms: u64,
}

// == Debouncer ==
/// Clock-driven debouncer.
///
/// `set` restarts the wait; `value` publishes the pending input once the
/// clock reaches its deadline. Dropping the debouncer discards anything
/// pending, so nothing is published after teardown.
#[derive(Debug)]
pub struct Debouncer<T> {
    current: T,
    pending: Option<Pending<T>>,
    delay: Duration,
    clock: SharedClock,
}

impl<T: Clone> Debouncer<T> {
    pub fn new(initial: T, delay: Duration, clock: SharedClock) -> Self {
        Self {
            current: initial,
            pending: None,
            delay,
            clock,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    // == Set ==
    /// Feeds a new input value, replacing any pending one.
    pub fn set(&mut self, value: T) {
        if self.delay.is_zero() {
            self.pending = None;
            self.current = value;
            return;
        }

        let deadline_ms = self.clock.now_ms().saturating_add(self.delay_ms());
        trace!("Debounce deadline moved to {}", deadline_ms);
        self.pending = Some(Pending { value, deadline_ms });
    }

    // == Value ==
    /// Returns the debounced value, publishing the pending input if its
    /// deadline has passed.
    pub fn value(&mut self) -> &T {
        self.settle();
        &self.current
    }

    /// Returns the last published value without advancing.
    pub fn published(&self) -> &T {
        &self.current
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    // == Cancel ==
    /// Discards the pending input; the published value is unchanged.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Publishes the pending input immediately.
    pub fn flush(&mut self) -> &T {
        if let Some(pending) = self.pending.take() {
            self.current = pending.value;
        }
        &self.current
    }

    // == Settled ==
    /// Waits until the pending input is published and returns it.
    pub async fn settled(&mut self) -> &T {
        while let Some(deadline_ms) = self.pending.as_ref().map(|p| p.deadline_ms) {
            let now = self.clock.now_ms();
            if now >= deadline_ms {
                break;
            }
            tokio::time::sleep(Duration::from_millis(deadline_ms - now)).await;
        }
        self.value()
    }

    fn settle(&mut self) {
        let now = self.clock.now_ms();
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline_ms)
        {
            if let Some(pending) = self.pending.take() {
                self.current = pending.value;
            }
        }
    }

    fn delay_ms(&self) -> u64 {
        u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX)
    }
}
