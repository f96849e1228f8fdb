use std::sync::Arc;

use log::{debug, warn};

use crate::clock::PlaybackStatus;
use crate::constants::PLAYER_INTERFACE;
use crate::pipeline::{ChangeConsumer, ChangeEvent};
use crate::player::art_url;

use super::dispatch::{Call, Dispatcher, PlayerControl, Reply};
use super::properties::{self, Metadata};
use super::Endpoint;

/// The MPRIS player object: dispatches calls and emits change signals.
pub struct PlayerService {
    control: Arc<dyn PlayerControl>,
    endpoint: Arc<dyn Endpoint>,
    dispatcher: Dispatcher,
}

impl PlayerService {
    pub fn new(control: Arc<dyn PlayerControl>, endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            control,
            endpoint,
            dispatcher: Dispatcher::new(),
        }
    }

    /// Dispatch `call`, hand the reply to `respond`, then apply the reply's
    /// side effects.
    ///
    /// The caller is answered before a termination closes the transport.
    pub fn handle<F>(&self, call: &Call, respond: F)
    where
        F: FnOnce(&Reply),
    {
        let reply = self.dispatcher.dispatch(self.control.as_ref(), call);
        debug!("{}.{} -> {:?}", call.interface, call.member, reply);
        respond(&reply);

        match reply {
            Reply::StatusChanged(status) => self.emit_status(status),
            Reply::Terminate(kind) => self.control.terminate(kind),
            _ => {}
        }
    }

    /// Notify a status change immediately, outside the change pipeline.
    pub fn emit_status(&self, status: PlaybackStatus) {
        let changes = properties::status_changes(status);
        if let Err(err) = self
            .endpoint
            .emit_properties_changed(PLAYER_INTERFACE, &changes)
        {
            warn!("status signal dropped: {}", err);
        }
    }

    /// The transport stopped delivering calls.
    pub fn connection_lost(&self) {
        self.control.connection_lost();
    }

    /// Drain the change pipeline, one signal per delivered event.
    ///
    /// Returns when the producer side is dropped.
    pub fn run_emitter(&self, mut consumer: ChangeConsumer) {
        for event in consumer.by_ref() {
            self.emit_event(&event);
        }
        debug!(
            "change pipeline closed, {} duplicate events suppressed",
            consumer.suppressed()
        );
    }

    fn emit_event(&self, event: &ChangeEvent) {
        let status = if event.is_paused {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Playing
        };
        let metadata = Metadata {
            title: self.control.name(),
            artist: vec![event.remaining_text.clone()],
            art_url: art_url(event.image_path.as_deref()),
        };
        let changes = properties::event_changes(status, metadata);
        if let Err(err) = self
            .endpoint
            .emit_properties_changed(event.interface, &changes)
        {
            warn!("change signal dropped: {}", err);
        }
    }
}
