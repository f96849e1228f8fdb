//! Worker threads of a running session.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::clock::format_duration;
use crate::image::ImageCache;
use crate::mpris::PlayerService;
use crate::pipeline::{ChangeConsumer, ChangeEvent, ChangeProducer};
use crate::subscribers::SubscriberBus;

use super::guard::LoopGuard;
use super::{SessionCore, SessionEnd};

/// Longest uninterrupted sleep, so loops notice `done` promptly.
const MAX_SLEEP_SLICE: Duration = Duration::from_millis(25);

/// Highest progress a live frame renders; the full ring belongs to the final
/// event.
const LIVE_PROGRESS_CAP: f64 = 99.99;

/// Everything the logic loop owns.
pub(super) struct LogicContext {
    pub(super) core: Arc<SessionCore>,
    pub(super) cache: Arc<ImageCache>,
    pub(super) producer: ChangeProducer,
    pub(super) subscribers: SubscriberBus,
    pub(super) interval: Duration,
}

pub(super) fn spawn_logic_loop(ctx: LogicContext) {
    thread::spawn(move || {
        let _guard = LoopGuard::new(ctx.core.active_loops.clone());
        run_logic_loop(ctx);
    });
}

pub(super) fn spawn_render_loop(core: Arc<SessionCore>, cache: Arc<ImageCache>, fps: u32) {
    thread::spawn(move || {
        let _guard = LoopGuard::new(core.active_loops.clone());
        run_render_loop(&core, &cache, fps);
    });
}

pub(super) fn spawn_emitter(
    core: Arc<SessionCore>,
    service: Arc<PlayerService>,
    consumer: ChangeConsumer,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let _guard = LoopGuard::new(core.active_loops.clone());
        service.run_emitter(consumer);
    })
}

/// Sample the clock each interval, publish the snapshot and detect completion.
fn run_logic_loop(ctx: LogicContext) {
    let LogicContext {
        core,
        cache,
        producer,
        subscribers,
        interval,
    } = ctx;

    loop {
        if !sleep_unless_done(&core, interval) {
            break;
        }

        // The clock stays locked until the snapshot reflects this tick, so a
        // concurrent toggle is never overwritten by a stale sample.
        let mut clock = core.clock.lock().unwrap();
        let Some(tick) = clock.tick(Instant::now()) else {
            break;
        };
        if tick.finished {
            drop(clock);
            finish(&core, &cache, producer);
            return;
        }

        let snapshot = {
            let mut snapshot = core.snapshot.lock().unwrap();
            snapshot.progress = tick.progress;
            snapshot.remaining_text = format_duration(tick.remaining);
            snapshot.is_paused = tick.paused;
            snapshot.clone()
        };
        drop(clock);

        if !producer.push(ChangeEvent::from_snapshot(&snapshot)) {
            warn!("change emitter is gone, stopping logic loop");
            break;
        }
        subscribers.broadcast(&snapshot, core.finished.load(Ordering::SeqCst));
    }

    debug!("logic loop of {:?} stopped", core.name);
}

/// Publish the completed state once, wait for it to be emitted, then end the
/// session.
fn finish(core: &SessionCore, cache: &ImageCache, producer: ChangeProducer) {
    core.finished.store(true, Ordering::SeqCst);

    let image_path = match cache.get(100.0, &core.style) {
        Ok(path) => Some(path),
        Err(err) => {
            warn!("final ring image: {}", err);
            None
        }
    };
    let snapshot = {
        let mut snapshot = core.snapshot.lock().unwrap();
        snapshot.progress = 100.0;
        snapshot.remaining_text = format_duration(Duration::ZERO);
        snapshot.is_paused = false;
        if image_path.is_some() {
            snapshot.image_path = image_path;
        }
        snapshot.clone()
    };

    producer.push(ChangeEvent::final_from(&snapshot));
    drop(producer);
    let emitter = core.emitter.lock().unwrap().take();
    if let Some(emitter) = emitter {
        if emitter.join().is_err() {
            warn!("change emitter panicked");
        }
    }

    core.teardown(SessionEnd::Finished);
}

/// Refresh the ring image for the current progress at `fps`.
fn run_render_loop(core: &SessionCore, cache: &ImageCache, fps: u32) {
    let frame = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));

    while sleep_unless_done(core, frame) {
        if core.finished.load(Ordering::SeqCst) {
            break;
        }
        let progress = core.snapshot.lock().unwrap().progress.min(LIVE_PROGRESS_CAP);
        match cache.get(progress, &core.style) {
            Ok(path) => core.snapshot.lock().unwrap().image_path = Some(path),
            Err(err) => warn!("ring image for {:.2}%: {}", progress, err),
        }
    }

    debug!("render loop of {:?} stopped", core.name);
}

/// Sleep for `duration` in short slices. Returns `false` as soon as the
/// session is done.
fn sleep_unless_done(core: &SessionCore, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if core.is_done() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(MAX_SLEEP_SLICE));
    }
}
