//! `render` subcommand: produce one ring through the image cache.

use std::error::Error;
use std::path::Path;

use clap::ArgMatches;
use log::info;
use playtimer_lib::image::ImageCache;

use super::settings;

/// Render the ring for `--progress`, print its path and optionally write the
/// PNG rendition to `--png`.
pub fn run_render(args: &ArgMatches) -> Result<i32, Box<dyn Error>> {
    let raw = args
        .get_one::<String>("progress")
        .map(String::as_str)
        .unwrap_or_default();
    let progress = raw
        .parse::<f64>()
        .map_err(|err| format!("invalid progress {:?}: {}", raw, err))?;

    let config = settings::player_config(args)?;
    let cache = ImageCache::new(config.cache_dir());
    let path = cache.get(progress, &config.style)?;
    println!("{}", path.display());

    if let Some(out) = args.get_one::<String>("png") {
        let png = cache.rasterize(&path)?;
        std::fs::write(Path::new(out), &png)?;
        info!("wrote {} bytes of png to {}", png.len(), out);
    }

    Ok(0)
}
