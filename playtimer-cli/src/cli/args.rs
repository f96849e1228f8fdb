//! CLI argument definitions for `play-timer`.

use clap::{Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("Play Timer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Countdown timer that shows up as a desktop media player")
        .arg_required_else_help(true)
        .arg(
            Arg::new("start")
                .long("start")
                .short('s')
                .value_name("SECONDS")
                .allow_hyphen_values(true)
                .help("Start a timer of the given length in seconds"),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .value_name("TITLE")
                .default_value("Timer")
                .help("Name of the timer, shown as the track title"),
        )
        .arg(
            Arg::new("text")
                .long("text")
                .value_name("TEXT")
                .default_value("Time is up!")
                .help("Notification text"),
        )
        .arg(
            Arg::new("notify")
                .long("notify")
                .action(ArgAction::SetTrue)
                .help("Send a desktop notification when the timer finishes"),
        )
        .arg(
            Arg::new("sound")
                .long("sound")
                .value_name("FILE")
                .num_args(0..=1)
                .help("Play a sound when the timer finishes (a chime unless FILE is given)"),
        )
        .arg(
            Arg::new("volume")
                .long("volume")
                .value_name("VOLUME")
                .default_value("1.0")
                .help("Volume of the finish sound (0.0-1.0)"),
        )
        .arg(
            Arg::new("low-fps")
                .long("low-fps")
                .action(ArgAction::SetTrue)
                .help("Render the progress image at 1 fps regardless of the desktop"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .help("Do not show the terminal status view"),
        )
        .arg(
            Arg::new("color")
                .long("color")
                .value_name("HEX")
                .global(true)
                .help("Progress ring color, #RGB or #RRGGBB"),
        )
        .arg(
            Arg::new("shadow")
                .long("shadow")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Draw a drop shadow under the ring"),
        )
        .arg(
            Arg::new("rounded")
                .long("rounded")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Use round line caps on the ring"),
        )
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .value_name("DIR")
                .global(true)
                .help("Image cache directory (default: $XDG_CACHE_HOME/<app id>)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .global(true)
                .help("Path to a JSON file with player settings"),
        )
        .subcommand(
            Command::new("render")
                .about("Render one progress ring through the cache and print its path")
                .arg(
                    Arg::new("progress")
                        .long("progress")
                        .short('p')
                        .value_name("PERCENT")
                        .required(true)
                        .allow_hyphen_values(true)
                        .help("Progress in percent (0-100)"),
                )
                .arg(
                    Arg::new("png")
                        .long("png")
                        .value_name("OUT")
                        .help("Also write the cropped, mirrored PNG rendition here"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_flags_reach_the_render_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["play-timer", "render", "--progress", "40", "--rounded"])
            .expect("parse");
        let (name, render) = matches.subcommand().expect("subcommand");
        assert_eq!(name, "render");
        assert!(render.get_flag("rounded"));
        assert_eq!(render.get_one::<String>("progress").unwrap(), "40");
    }

    #[test]
    fn run_defaults_are_filled_in() {
        let matches = build_cli()
            .try_get_matches_from(["play-timer", "--start", "90"])
            .expect("parse");
        assert_eq!(matches.get_one::<String>("start").unwrap(), "90");
        assert_eq!(matches.get_one::<String>("title").unwrap(), "Timer");
        assert_eq!(matches.get_one::<String>("volume").unwrap(), "1.0");
        assert!(!matches.get_flag("notify"));
    }
}
