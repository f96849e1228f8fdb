//! Timer session lifecycle.
//!
//! A [`TimerSession`] is configured once, then started into a [`TimerPlayer`]
//! that owns the logic loop, the render loop and the change emitter. The
//! session ends exactly once, by completion, by a termination request from a
//! remote caller, or by [`TimerPlayer::destroy`]. The outcome is reported as a
//! [`SessionEnd`]; deciding what that means for the process is left to the
//! caller.

mod guard;
mod runtime;
mod state;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::clock::{self, Clock, PlaybackStatus};
use crate::config::{PlayerConfig, RingStyle};
use crate::constants::{PLAYER_INTERFACE, ROOT_INTERFACE};
use crate::error::PlayerError;
use crate::image::ImageCache;
use crate::mpris::{self, Call, Endpoint, Metadata, PlayerControl, PlayerService, SessionBus};
use crate::pipeline;
use crate::subscribers::SubscriberBus;

use guard::CloseGuard;

pub(crate) use state::art_url;
pub use state::Snapshot;

/// Why a remote caller asked the session to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationKind {
    Quit,
    Next,
    Stop,
}

/// Terminal outcome of a session, delivered once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The countdown reached 100%.
    Finished,
    /// A remote caller requested termination.
    Terminated(TerminationKind),
    /// The owner destroyed the session.
    Cancelled,
    /// The bus connection went away while the session was live.
    Disconnected,
}

/// A configured, not yet started timer.
pub struct TimerSession {
    name: String,
    duration: Duration,
    config: PlayerConfig,
    cache: Arc<ImageCache>,
    subscribers: SubscriberBus,
}

impl TimerSession {
    /// Create a session counting down `seconds`.
    ///
    /// Fails with [`PlayerError::InvalidDuration`] unless `seconds` is
    /// strictly positive.
    pub fn new(
        seconds: i64,
        name: impl Into<String>,
        config: PlayerConfig,
        cache: Arc<ImageCache>,
    ) -> Result<Self, PlayerError> {
        if seconds <= 0 {
            return Err(PlayerError::InvalidDuration(seconds));
        }

        Ok(Self {
            name: name.into(),
            duration: Duration::from_secs(seconds as u64),
            config,
            cache,
            subscribers: SubscriberBus::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Logic tick interval this session will run at.
    pub fn tick_interval(&self) -> Duration {
        clock::tick_interval(self.duration)
    }

    /// Register a snapshot callback. Only possible before start.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback);
    }

    /// Own a fresh per-run name on the session bus and start the timer there.
    pub fn start(self) -> Result<TimerPlayer, PlayerError> {
        let endpoint = SessionBus::connect(&mpris::service_name())?;
        self.start_with(Arc::new(endpoint))
    }

    /// Start the timer on an already connected endpoint.
    pub fn start_with(self, endpoint: Arc<dyn Endpoint>) -> Result<TimerPlayer, PlayerError> {
        let TimerSession {
            name,
            duration,
            config,
            cache,
            subscribers,
        } = self;
        let style = config.style.clone();
        let fps = config.render_fps();

        let image_path = match cache.get(0.0, &style) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!("initial ring image: {}", err);
                None
            }
        };
        let snapshot = Snapshot {
            progress: 0.0,
            remaining_text: clock::format_duration(duration),
            image_path,
            is_paused: false,
        };

        let (outcome_tx, outcome_rx) = mpsc::sync_channel(1);
        let core = Arc::new(SessionCore {
            name,
            style,
            clock: Mutex::new(Clock::new(duration, Instant::now())),
            snapshot: Mutex::new(snapshot),
            done: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            close_guard: CloseGuard::default(),
            endpoint: endpoint.clone(),
            outcome: Mutex::new(Some(outcome_tx)),
            emitter: Mutex::new(None),
            active_loops: Arc::new(AtomicUsize::new(0)),
        });
        let service = Arc::new(PlayerService::new(core.clone(), endpoint.clone()));

        if let Err(err) = endpoint.serve(service.clone()) {
            core.teardown(SessionEnd::Cancelled);
            return Err(err);
        }

        let (producer, consumer) = pipeline::channel();
        let emitter = runtime::spawn_emitter(core.clone(), service.clone(), consumer);
        *core.emitter.lock().unwrap() = Some(emitter);
        runtime::spawn_render_loop(core.clone(), cache.clone(), fps);
        runtime::spawn_logic_loop(runtime::LogicContext {
            core: core.clone(),
            cache,
            producer,
            subscribers,
            interval: clock::tick_interval(duration),
        });

        let service_name = endpoint.service_name();
        info!(
            "timer {:?} started for {} on {} ({} fps)",
            core.name,
            clock::format_duration(duration),
            service_name,
            fps
        );

        Ok(TimerPlayer {
            core,
            service,
            service_name,
            outcome: Mutex::new(Outcome {
                receiver: outcome_rx,
                end: None,
            }),
        })
    }
}

struct Outcome {
    receiver: Receiver<SessionEnd>,
    end: Option<SessionEnd>,
}

/// A running timer. Dropping it destroys the session.
pub struct TimerPlayer {
    core: Arc<SessionCore>,
    service: Arc<PlayerService>,
    service_name: String,
    outcome: Mutex<Outcome>,
}

impl TimerPlayer {
    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn snapshot(&self) -> Snapshot {
        self.core.snapshot.lock().unwrap().clone()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.core.status()
    }

    pub fn is_finished(&self) -> bool {
        self.core.finished.load(Ordering::SeqCst)
    }

    /// Toggle play/pause as if a remote caller had sent `PlayPause`.
    pub fn play_pause(&self) {
        self.service
            .handle(&Call::new(PLAYER_INTERFACE, "PlayPause"), |_| {});
    }

    /// Rewind as if a remote caller had sent `Previous`.
    pub fn restart(&self) {
        self.service
            .handle(&Call::new(PLAYER_INTERFACE, "Previous"), |_| {});
    }

    /// End the session as if a remote caller had sent `Quit`.
    pub fn quit(&self) {
        self.service.handle(&Call::new(ROOT_INTERFACE, "Quit"), |_| {});
    }

    /// Stop all loops and release the endpoint.
    ///
    /// Safe to call at any time and any number of times; only the first call
    /// on a live session has an effect. Returns whether this call ended it.
    pub fn destroy(&self) -> bool {
        self.core.teardown(SessionEnd::Cancelled)
    }

    /// Block until the session ends.
    pub fn wait(&self) -> SessionEnd {
        let mut outcome = self.outcome.lock().unwrap();
        if let Some(end) = outcome.end {
            return end;
        }
        let end = outcome.receiver.recv().unwrap_or(SessionEnd::Cancelled);
        outcome.end = Some(end);
        end
    }

    /// Wait up to `timeout` for the session to end.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<SessionEnd> {
        let mut outcome = self.outcome.lock().unwrap();
        if outcome.end.is_some() {
            return outcome.end;
        }
        let end = match outcome.receiver.recv_timeout(timeout) {
            Ok(end) => end,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => SessionEnd::Cancelled,
        };
        outcome.end = Some(end);
        Some(end)
    }

    /// Number of session threads still alive.
    pub fn active_loops(&self) -> usize {
        self.core.active_loops.load(Ordering::SeqCst)
    }
}

impl Drop for TimerPlayer {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// State shared between the loops, the service and the owner.
pub(crate) struct SessionCore {
    name: String,
    style: RingStyle,
    clock: Mutex<Clock>,
    snapshot: Mutex<Snapshot>,
    done: AtomicBool,
    finished: AtomicBool,
    close_guard: CloseGuard,
    endpoint: Arc<dyn Endpoint>,
    outcome: Mutex<Option<SyncSender<SessionEnd>>>,
    emitter: Mutex<Option<JoinHandle<()>>>,
    active_loops: Arc<AtomicUsize>,
}

impl SessionCore {
    fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// End the session once: stop the loops, close the endpoint and deliver
    /// `end`. Later calls return `false` and do nothing.
    fn teardown(&self, end: SessionEnd) -> bool {
        if !self.close_guard.close() {
            debug!("timer {:?} already ended, ignoring {:?}", self.name, end);
            return false;
        }

        self.done.store(true, Ordering::SeqCst);
        self.endpoint.close();
        if let Some(sender) = self.outcome.lock().unwrap().take() {
            // Capacity one and a single send, so this never blocks.
            let _ = sender.send(end);
        }
        info!("timer {:?} ended: {:?}", self.name, end);
        true
    }

    /// Mirror a status change into the snapshot. Callers hold the clock lock,
    /// the same order the logic loop takes them in.
    fn set_paused(&self, status: Option<PlaybackStatus>) -> Option<PlaybackStatus> {
        if let Some(status) = status {
            self.snapshot.lock().unwrap().is_paused = status == PlaybackStatus::Paused;
            info!("timer {:?} {}", self.name, status.as_str());
        }
        status
    }
}

impl PlayerControl for SessionCore {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn status(&self) -> PlaybackStatus {
        self.clock.lock().unwrap().status()
    }

    fn metadata(&self) -> Metadata {
        let snapshot = self.snapshot.lock().unwrap();
        Metadata {
            title: self.name.clone(),
            artist: vec![snapshot.remaining_text.clone()],
            art_url: snapshot.art_url(),
        }
    }

    fn toggle(&self) -> Option<PlaybackStatus> {
        if self.is_done() {
            return None;
        }
        let mut clock = self.clock.lock().unwrap();
        let status = clock.toggle(Instant::now());
        self.set_paused(status)
    }

    fn play(&self) -> Option<PlaybackStatus> {
        if self.is_done() {
            return None;
        }
        let mut clock = self.clock.lock().unwrap();
        if !clock.resume(Instant::now()) {
            return None;
        }
        self.set_paused(Some(PlaybackStatus::Playing))
    }

    fn pause(&self) -> Option<PlaybackStatus> {
        if self.is_done() {
            return None;
        }
        let mut clock = self.clock.lock().unwrap();
        if !clock.pause(Instant::now()) {
            return None;
        }
        self.set_paused(Some(PlaybackStatus::Paused))
    }

    fn restart(&self) -> bool {
        if self.is_done() {
            return false;
        }
        let mut clock = self.clock.lock().unwrap();
        if !clock.restart(Instant::now()) {
            return false;
        }
        self.snapshot.lock().unwrap().is_paused = false;
        info!("timer {:?} restarted", self.name);
        true
    }

    fn terminate(&self, kind: TerminationKind) {
        self.teardown(SessionEnd::Terminated(kind));
    }

    fn connection_lost(&self) {
        if self.is_done() {
            return;
        }
        error!("timer {:?} lost its bus connection", self.name);
        self.teardown(SessionEnd::Disconnected);
    }
}
