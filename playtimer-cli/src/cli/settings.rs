//! Player configuration assembled from defaults, an optional JSON file and
//! command line flags, in increasing precedence.

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use log::info;
use playtimer_lib::config::{ConfigError, PlayerConfig};

pub fn player_config(args: &ArgMatches) -> Result<PlayerConfig, ConfigError> {
    let mut config = match args.get_one::<String>("config") {
        Some(path) => {
            info!("loading settings from {}", path);
            PlayerConfig::from_json_file(Path::new(path))?
        }
        None => PlayerConfig::default(),
    };

    let color = args
        .get_one::<String>("color")
        .cloned()
        .unwrap_or_else(|| config.style.color.clone());
    config.style = config.style.with_color(&color);

    if args.get_flag("shadow") {
        config.style.shadow = true;
    }
    if args.get_flag("rounded") {
        config.style.rounded = true;
    }
    if flag(args, "low-fps") {
        config.low_fps = true;
    }
    if let Some(dir) = args.get_one::<String>("cache-dir") {
        config.cache_dir = Some(PathBuf::from(dir));
    }

    Ok(config)
}

/// Like `get_flag`, but false for flags the subcommand does not define.
fn flag(args: &ArgMatches, id: &str) -> bool {
    args.try_get_one::<bool>(id)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::build_cli;

    fn parse(argv: &[&str]) -> ArgMatches {
        build_cli().try_get_matches_from(argv).expect("parse")
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r##"{"style": {"color": "#00ff00", "shadow": false}, "low_fps": false}"##,
        )
        .expect("write config");

        let matches = parse(&[
            "play-timer",
            "--start",
            "5",
            "--config",
            path.to_str().unwrap(),
            "--shadow",
            "--low-fps",
            "--color",
            "#abc",
        ]);
        let config = player_config(&matches).expect("config");
        assert_eq!(config.style.color, "#abc");
        assert!(config.style.shadow);
        assert!(config.low_fps);
    }

    #[test]
    fn invalid_file_color_falls_back_to_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"style": {"color": "teal"}}"#).expect("write config");

        let matches = parse(&["play-timer", "--start", "5", "--config", path.to_str().unwrap()]);
        let config = player_config(&matches).expect("config");
        assert_eq!(config.style.color, playtimer_lib::constants::DEFAULT_COLOR);
    }

    #[test]
    fn render_subcommand_has_no_low_fps_flag() {
        let matches = parse(&["play-timer", "render", "--progress", "1", "--cache-dir", "/tmp/x"]);
        let (_, render) = matches.subcommand().expect("subcommand");
        let config = player_config(render).expect("config");
        assert!(!config.low_fps);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/x")));
    }
}
