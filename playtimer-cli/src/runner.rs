use std::{
    error::Error,
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::ArgMatches;
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use playtimer_lib::{
    image::ImageCache,
    player::{SessionEnd, Snapshot, TerminationKind, TimerPlayer, TimerSession},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::completion::{Completion, Sound};
use crate::logging::LogBuffer;
use crate::{cli, controls, logging, ui};

/// How often the status view is refreshed while waiting for the session.
const REFRESH_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(args: &ArgMatches, log_buffer: LogBuffer) -> Result<i32, Box<dyn Error>> {
    if let Some(render_args) = args.subcommand_matches("render") {
        return cli::render::run_render(render_args);
    }

    let raw = args
        .get_one::<String>("start")
        .ok_or("nothing to do, pass --start SECONDS")?;
    let seconds = raw
        .parse::<i64>()
        .map_err(|err| format!("invalid duration {:?}: {}", raw, err))?;
    let volume = args
        .get_one::<String>("volume")
        .map(String::as_str)
        .unwrap_or("1.0")
        .parse::<f32>()
        .map_err(|err| format!("invalid volume: {}", err))?;
    let title = args
        .get_one::<String>("title")
        .cloned()
        .unwrap_or_default();
    let quiet = args.get_flag("quiet");

    let completion = Completion {
        title: title.clone(),
        text: args.get_one::<String>("text").cloned().unwrap_or_default(),
        notify: args.get_flag("notify"),
        sound: requested_sound(args),
        volume,
    };

    let config = cli::settings::player_config(args)?;
    let cache = Arc::new(ImageCache::new(config.cache_dir()));
    // Detached; lookups fall back to the disk until it completes.
    let _ = cache.warm_up();

    let mut session = TimerSession::new(seconds, title, config, cache)?;
    let latest = Arc::new(Mutex::new(None::<Snapshot>));
    {
        let latest = latest.clone();
        session.subscribe(move |snapshot| {
            *latest.lock().unwrap() = Some(snapshot.clone());
        });
    }

    info!("timer requested, duration = {} sec", seconds);
    let player = session.start()?;

    let end = run_session(&player, &latest, &log_buffer, quiet);
    info!("timer done: {:?}", end);

    if end == SessionEnd::Finished {
        completion.announce();
    }

    Ok(exit_code(end))
}

/// Wait for the session to end while serving the keyboard and, unless
/// `quiet`, the status view.
fn run_session(
    player: &TimerPlayer,
    latest: &Mutex<Option<Snapshot>>,
    log_buffer: &LogBuffer,
    quiet: bool,
) -> SessionEnd {
    let _raw_mode = RawModeGuard::enable().ok();
    let mut terminal = if !quiet {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, EnterAlternateScreen, cursor::Hide);
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).ok()
    } else {
        None
    };

    let mut accepting_keys = true;
    let end = loop {
        if let Some(end) = player.wait_timeout(REFRESH_INTERVAL) {
            break end;
        }

        if let Some(term) = terminal.as_mut() {
            let snapshot = latest
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| player.snapshot());
            let status = controls::status_text(controls::StatusArgs {
                title: player.name(),
                service_name: player.service_name(),
                status: player.status(),
                snapshot: &snapshot,
            });
            let log_lines = logging::snapshot(log_buffer);
            ui::draw_status(term, &status, &log_lines);
        }

        if accepting_keys {
            accepting_keys = controls::handle_key_event(player);
        }
    };

    // Restore the terminal state before announcing anything.
    if let Some(mut term) = terminal {
        let _ = term.show_cursor();
        let stdout = term.backend_mut();
        let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
    }

    end
}

/// `--sound FILE` plays the file, a bare `--sound` the built-in chime.
fn requested_sound(args: &ArgMatches) -> Option<Sound> {
    if !args.contains_id("sound") {
        return None;
    }
    Some(match args.get_one::<String>("sound") {
        Some(path) => Sound::File(PathBuf::from(path)),
        None => Sound::Chime,
    })
}

/// Process exit code for a session outcome.
pub fn exit_code(end: SessionEnd) -> i32 {
    match end {
        SessionEnd::Finished
        | SessionEnd::Cancelled
        | SessionEnd::Terminated(TerminationKind::Quit) => 0,
        SessionEnd::Terminated(TerminationKind::Next | TerminationKind::Stop) => 1,
        SessionEnd::Disconnected => -1,
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
