//! In-process fan-out of live snapshots, independent of the bus.
//!
//! Subscribers are registered before the session starts and live as long as
//! the session. A panicking subscriber is logged and skipped; it never takes
//! the logic loop down with it.

use std::panic::{self, AssertUnwindSafe};

use log::error;

use crate::player::Snapshot;

/// Callback invoked with the current snapshot on every live tick.
pub type Subscriber = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// Append-only list of snapshot subscribers.
#[derive(Default)]
pub struct SubscriberBus {
    subscribers: Vec<Subscriber>,
}

impl SubscriberBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. There is no way to unregister.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `snapshot` to every subscriber unless the session `finished`.
    ///
    /// Returns how many callbacks returned normally.
    pub fn broadcast(&self, snapshot: &Snapshot, finished: bool) -> usize {
        if finished {
            return 0;
        }

        let mut delivered = 0;
        for (index, subscriber) in self.subscribers.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| subscriber(snapshot))) {
                Ok(()) => delivered += 1,
                Err(_) => error!("subscriber {} panicked, continuing", index),
            }
        }
        delivered
    }
}

impl std::fmt::Debug for SubscriberBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
