//! In-memory doubles for the bus endpoint and the session controls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::clock::PlaybackStatus;
use crate::error::PlayerError;
use crate::player::TerminationKind;

use super::dispatch::{Call, PlayerControl, Reply};
use super::properties::{Change, Metadata};
use super::{Endpoint, PlayerService};

/// One recorded `PropertiesChanged` emission.
#[derive(Debug, Clone)]
pub(crate) struct Emission {
    pub interface: String,
    pub changes: Vec<Change>,
}

impl Emission {
    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.changes.iter().map(|(name, _)| *name).collect()
    }
}

/// Endpoint that records emissions and lets tests issue calls.
#[derive(Default)]
pub(crate) struct RecordingEndpoint {
    service: Mutex<Option<Arc<PlayerService>>>,
    emissions: Mutex<Vec<Emission>>,
    closes: AtomicUsize,
    refuse_serve: bool,
}

impl RecordingEndpoint {
    /// An endpoint whose `serve` fails, as if the bus name were taken.
    pub(crate) fn refusing() -> Self {
        Self {
            refuse_serve: true,
            ..Self::default()
        }
    }

    /// Send a call through the served service and return its reply.
    pub(crate) fn call(&self, call: Call) -> Option<Reply> {
        let service = self.service.lock().unwrap().clone()?;
        let mut answer = None;
        service.handle(&call, |reply| answer = Some(reply.clone()));
        answer
    }

    pub(crate) fn emissions(&self) -> Vec<Emission> {
        self.emissions.lock().unwrap().clone()
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Endpoint for RecordingEndpoint {
    fn service_name(&self) -> String {
        "org.mpris.MediaPlayer2.test.run-0".to_string()
    }

    fn serve(&self, service: Arc<PlayerService>) -> Result<(), PlayerError> {
        if self.refuse_serve {
            return Err(PlayerError::NameOwnership("name taken".to_string()));
        }
        *self.service.lock().unwrap() = Some(service);
        Ok(())
    }

    fn emit_properties_changed(
        &self,
        interface: &str,
        changes: &[Change],
    ) -> Result<(), PlayerError> {
        if self.closes() > 0 {
            return Err(PlayerError::Emit("connection closed".to_string()));
        }
        self.emissions.lock().unwrap().push(Emission {
            interface: interface.to_string(),
            changes: changes.to_vec(),
        });
        Ok(())
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.service.lock().unwrap().take();
    }
}

/// Session controls backed by plain fields.
pub(crate) struct FakeControl {
    status: Mutex<PlaybackStatus>,
    restarts: AtomicUsize,
    terminated: Mutex<Option<TerminationKind>>,
}

impl Default for FakeControl {
    fn default() -> Self {
        Self {
            status: Mutex::new(PlaybackStatus::Playing),
            restarts: AtomicUsize::new(0),
            terminated: Mutex::new(None),
        }
    }
}

impl FakeControl {
    pub(crate) fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }

    pub(crate) fn terminated(&self) -> Option<TerminationKind> {
        *self.terminated.lock().unwrap()
    }

    fn set(&self, target: PlaybackStatus) -> Option<PlaybackStatus> {
        let mut status = self.status.lock().unwrap();
        if *status == target {
            return None;
        }
        *status = target;
        Some(target)
    }
}

impl PlayerControl for FakeControl {
    fn name(&self) -> String {
        "Tea".to_string()
    }

    fn status(&self) -> PlaybackStatus {
        *self.status.lock().unwrap()
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            title: self.name(),
            artist: vec!["00:42".to_string()],
            art_url: String::new(),
        }
    }

    fn toggle(&self) -> Option<PlaybackStatus> {
        match self.status() {
            PlaybackStatus::Playing => self.set(PlaybackStatus::Paused),
            PlaybackStatus::Paused => self.set(PlaybackStatus::Playing),
        }
    }

    fn play(&self) -> Option<PlaybackStatus> {
        self.set(PlaybackStatus::Playing)
    }

    fn pause(&self) -> Option<PlaybackStatus> {
        self.set(PlaybackStatus::Paused)
    }

    fn restart(&self) -> bool {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn terminate(&self, kind: TerminationKind) {
        *self.terminated.lock().unwrap() = Some(kind);
    }

    fn connection_lost(&self) {}
}
