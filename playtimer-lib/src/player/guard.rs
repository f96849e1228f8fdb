//! Lifetime guards for session shutdown and worker threads.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// One-shot latch: the first `close` wins, every later call is a no-op.
#[derive(Debug, Default)]
pub(super) struct CloseGuard {
    closed: AtomicBool,
}

impl CloseGuard {
    /// Returns `true` only for the call that performed the close.
    pub(super) fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(super) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Keeps `active` in sync with the number of live session threads.
pub(super) struct LoopGuard {
    active: Arc<AtomicUsize>,
}

impl LoopGuard {
    pub(super) fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
