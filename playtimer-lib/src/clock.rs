//! Countdown arithmetic with pause bookkeeping.
//!
//! The clock never reads the system time on its own: every operation takes
//! the current `Instant`, so the tick loops pass `Instant::now()` and tests
//! pass virtual instants.

use std::time::{Duration, Instant};

use crate::constants::{BASE_INTERVAL, LOW_PRECISION_AFTER};

/// Playback status as reported over MPRIS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
}

impl PlaybackStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}

/// Lifecycle of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Running,
    Paused,
    Finished,
}

/// Result of a single clock sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Percentage of the duration already elapsed, in `[0, 100]`.
    pub progress: f64,
    pub elapsed: Duration,
    pub remaining: Duration,
    pub paused: bool,
    /// True on the one tick that completed the countdown.
    pub finished: bool,
}

/// Countdown clock over a fixed, positive duration.
#[derive(Debug, Clone)]
pub struct Clock {
    duration: Duration,
    started_at: Instant,
    paused_at: Option<Instant>,
    paused_for: Duration,
    state: ClockState,
}

impl Clock {
    /// Create a running clock whose countdown starts at `now`.
    pub fn new(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            started_at: now,
            paused_at: None,
            paused_for: Duration::ZERO,
            state: ClockState::Running,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == ClockState::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.state == ClockState::Finished
    }

    /// Status for MPRIS consumers. A finished clock keeps reporting `Playing`.
    pub fn status(&self) -> PlaybackStatus {
        if self.is_paused() {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Playing
        }
    }

    /// Elapsed countdown time, excluding pauses. Frozen while paused.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let until = self.paused_at.unwrap_or(now);
        until
            .saturating_duration_since(self.started_at)
            .saturating_sub(self.paused_for)
    }

    /// Percentage of the duration elapsed at `now`, clamped to `[0, 100]`.
    pub fn progress(&self, now: Instant) -> f64 {
        if self.is_finished() {
            return 100.0;
        }
        let ratio = self.elapsed(now).as_secs_f64() / self.duration.as_secs_f64();
        (ratio * 100.0).clamp(0.0, 100.0)
    }

    /// Sample the clock.
    ///
    /// Returns `None` once the clock has finished; the tick that reaches 100%
    /// is returned with `finished` set and moves the clock to `Finished`.
    pub fn tick(&mut self, now: Instant) -> Option<Tick> {
        if self.is_finished() {
            return None;
        }

        let elapsed = self.elapsed(now);
        let progress = self.progress(now);
        let finished = progress >= 100.0;
        if finished {
            self.state = ClockState::Finished;
            self.paused_at = None;
        }

        Some(Tick {
            progress,
            elapsed,
            remaining: self.duration.saturating_sub(elapsed),
            paused: self.is_paused(),
            finished,
        })
    }

    /// Pause a running clock. Returns `false` if nothing changed.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.state != ClockState::Running {
            return false;
        }
        self.paused_at = Some(now);
        self.state = ClockState::Paused;
        true
    }

    /// Resume a paused clock. Returns `false` if nothing changed.
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.state != ClockState::Paused {
            return false;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_for += now.saturating_duration_since(paused_at);
        }
        self.state = ClockState::Running;
        true
    }

    /// Toggle between running and paused.
    ///
    /// Returns the new status, or `None` when the clock has finished.
    pub fn toggle(&mut self, now: Instant) -> Option<PlaybackStatus> {
        match self.state {
            ClockState::Running => self.pause(now),
            ClockState::Paused => self.resume(now),
            ClockState::Finished => return None,
        };
        Some(self.status())
    }

    /// Rewind the countdown so that it starts again at `now`.
    ///
    /// Pause bookkeeping is cleared and the clock runs. A finished clock
    /// stays finished and `false` is returned.
    pub fn restart(&mut self, now: Instant) -> bool {
        if self.is_finished() {
            return false;
        }
        self.started_at = now;
        self.paused_at = None;
        self.paused_for = Duration::ZERO;
        self.state = ClockState::Running;
        true
    }
}

/// Logic tick interval for a countdown of the given length.
///
/// Long timers trade precision for CPU time with a 1.5x wider interval.
pub fn tick_interval(duration: Duration) -> Duration {
    if duration > LOW_PRECISION_AFTER {
        BASE_INTERVAL + BASE_INTERVAL / 2
    } else {
        BASE_INTERVAL
    }
}

/// Format a duration as `HH:MM:SS`, or `MM:SS` below one hour.
///
/// The duration is rounded to the nearest second first.
pub fn format_duration(duration: Duration) -> String {
    let total = ((duration.as_nanos() + 500_000_000) / 1_000_000_000) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
