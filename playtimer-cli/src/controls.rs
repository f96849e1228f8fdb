use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use playtimer_lib::clock::PlaybackStatus;
use playtimer_lib::player::{Snapshot, TimerPlayer};

pub struct StatusSnapshot {
    pub text: String,
    /// Completed fraction in `[0, 1]`.
    pub ratio: f64,
}

pub struct StatusArgs<'a> {
    pub title: &'a str,
    pub service_name: &'a str,
    pub status: PlaybackStatus,
    pub snapshot: &'a Snapshot,
}

pub fn status_text(args: StatusArgs) -> StatusSnapshot {
    let state = match args.status {
        PlaybackStatus::Playing => "▶ Playing",
        PlaybackStatus::Paused => "⏸ Paused",
    };
    let remaining = if args.snapshot.remaining_text.is_empty() {
        "--:--"
    } else {
        args.snapshot.remaining_text.as_str()
    };
    let art = args.snapshot.art_url();
    let text = format!(
        "{}   {}   {} left   ({:>5.1}%)\nBus: {}\nArt: {}",
        state,
        args.title,
        remaining,
        args.snapshot.progress,
        args.service_name,
        if art.is_empty() { "none" } else { art.as_str() }
    );

    StatusSnapshot {
        text,
        ratio: (args.snapshot.progress / 100.0).clamp(0.0, 1.0),
    }
}

/// Poll one key press and apply it. Returns `false` once the user asked the
/// session to end.
pub fn handle_key_event(player: &TimerPlayer) -> bool {
    if event::poll(Duration::from_millis(100)).unwrap_or(false) {
        if let Ok(Event::Key(key)) = event::read() {
            if key.kind != KeyEventKind::Press {
                return true;
            }
            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    player.destroy();
                    return false;
                }
                KeyCode::Char('q') | KeyCode::Char('Q') => {
                    player.quit();
                    return false;
                }
                KeyCode::Char(' ') => player.play_pause(),
                KeyCode::Char('r') | KeyCode::Char('R') => player.restart(),
                _ => {}
            }
        }
    }

    true
}
