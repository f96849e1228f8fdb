//! Single-slot change queue between the logic loop and the bus emitter.
//!
//! The producer blocks while the previous event is still pending, so no event
//! is ever dropped. The consumer suppresses events whose visible content
//! matches the last delivered event, which bounds the signal rate to the rate
//! of visible change rather than the tick rate.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SyncSender};

use crate::constants::PLAYER_INTERFACE;
use crate::player::Snapshot;

/// Immutable copy of the visible timer state, addressed to an interface.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub interface: &'static str,
    pub remaining_text: String,
    pub image_path: Option<PathBuf>,
    pub is_paused: bool,
    /// Set on the completion broadcast, which is never suppressed.
    pub is_final: bool,
}

impl ChangeEvent {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            interface: PLAYER_INTERFACE,
            remaining_text: snapshot.remaining_text.clone(),
            image_path: snapshot.image_path.clone(),
            is_paused: snapshot.is_paused,
            is_final: false,
        }
    }

    /// The completion broadcast for `snapshot`.
    pub fn final_from(snapshot: &Snapshot) -> Self {
        Self {
            is_final: true,
            ..Self::from_snapshot(snapshot)
        }
    }

    fn same_content(&self, other: &Self) -> bool {
        self.remaining_text == other.remaining_text && self.image_path == other.image_path
    }
}

/// Create a connected producer/consumer pair with room for one event.
pub fn channel() -> (ChangeProducer, ChangeConsumer) {
    let (sender, receiver) = mpsc::sync_channel(1);
    (
        ChangeProducer { sender },
        ChangeConsumer {
            receiver,
            last_delivered: None,
            suppressed: 0,
        },
    )
}

/// Sending half, owned by the logic loop. Dropping it closes the pipeline.
#[derive(Debug)]
pub struct ChangeProducer {
    sender: SyncSender<ChangeEvent>,
}

impl ChangeProducer {
    /// Queue an event, blocking while the slot is occupied.
    ///
    /// Returns `false` once the consumer is gone.
    pub fn push(&self, event: ChangeEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Receiving half, owned by the emitter.
#[derive(Debug)]
pub struct ChangeConsumer {
    receiver: Receiver<ChangeEvent>,
    last_delivered: Option<ChangeEvent>,
    suppressed: u64,
}

impl ChangeConsumer {
    /// Number of events dropped as duplicates so far.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}

impl Iterator for ChangeConsumer {
    type Item = ChangeEvent;

    /// Block until the next event with new visible content, or `None` once
    /// the producer is dropped and the queue is drained.
    fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            let event = self.receiver.recv().ok()?;
            let duplicate = !event.is_final
                && self
                    .last_delivered
                    .as_ref()
                    .is_some_and(|last| last.same_content(&event));
            if duplicate {
                self.suppressed += 1;
                continue;
            }
            self.last_delivered = Some(event.clone());
            return Some(event);
        }
    }
}
