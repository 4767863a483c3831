//! crates/screening_core/src/debounce.rs
//!
//! A cancellable one-shot timer, and a debouncer that re-arms it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type Action = Box<dyn FnOnce() + Send + 'static>;

/// Runs an action once `delay` has elapsed unless cancelled first.
/// Dropping the timer cancels it.
pub struct DebounceTimer {
    token: CancellationToken,
    deadline: Instant,
    action: Arc<Mutex<Option<Action>>>,
}

fn take_action(slot: &Mutex<Option<Action>>) -> Option<Action> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take()
}

impl DebounceTimer {
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(delay: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        let deadline = Instant::now() + delay;
        let action: Arc<Mutex<Option<Action>>> = Arc::new(Mutex::new(Some(Box::new(action))));

        let cancelled = token.clone();
        let slot = action.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    if let Some(action) = take_action(&slot) {
                        action();
                    }
                }
            }
        });
        Self { token, deadline, action }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_due(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Runs the action now if the deadline has passed and the spawned task
    /// has not run it yet. Returns whether it ran here.
    pub fn fire_if_due(&self) -> bool {
        if self.token.is_cancelled() || !self.is_due() {
            return false;
        }
        match take_action(&self.action) {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Keeps at most one pending action: scheduling a new one cancels the previous
/// unless its window has already elapsed, in which case it runs first.
pub struct Debouncer {
    window: Duration,
    pending: Option<DebounceTimer>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, pending: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn schedule<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(timer) = &self.pending {
            timer.fire_if_due();
        }
        self.cancel();
        self.pending = Some(DebounceTimer::arm(self.window, action));
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.cancel();
        }
    }
}
