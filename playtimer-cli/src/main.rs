//! # Play Timer
//!
//! A countdown timer that shows up as a media player on the desktop.

use log::error;

mod cli;
mod completion;
mod controls;
mod logging;
mod runner;
mod ui;

fn main() {
    let args = cli::args::build_cli().get_matches();
    let status_view = args.subcommand().is_none() && !args.get_flag("quiet");
    let log_buffer = logging::init(!status_view);

    let code = match runner::run(&args, log_buffer) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}
