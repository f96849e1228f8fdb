//! Disk-backed cache of progress-ring images.
//!
//! Rings are keyed by color, shadow flag, rounded flag and progress quantized
//! to two decimals. The cache only remembers which files exist; consumers read
//! the images back from disk. PNG renditions for tray-style consumers live
//! next to the SVGs with a `.png` suffix.

mod error;
mod raster;
mod svg;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::config::RingStyle;

pub use error::ImageError;

const SVG_EXTENSION: &str = "svg";
const PNG_EXTENSION: &str = "png";

/// Answer of the in-memory existence set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Hit,
    /// Warm-up has completed and the file is not known.
    Miss,
    /// Warm-up is still running; only the disk can tell.
    Unknown,
}

/// Cache of rendered progress rings under a root directory.
#[derive(Debug)]
pub struct ImageCache {
    root: PathBuf,
    vectors: RwLock<HashSet<PathBuf>>,
    rasters: RwLock<HashSet<PathBuf>>,
    warm: OnceLock<()>,
}

impl ImageCache {
    /// Create a cache rooted at `root`. Nothing is read until [`warm_up`] or
    /// the first lookup.
    ///
    /// [`warm_up`]: ImageCache::warm_up
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            vectors: RwLock::new(HashSet::new()),
            rasters: RwLock::new(HashSet::new()),
            warm: OnceLock::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the cache directory on a background thread.
    pub fn warm_up(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        thread::spawn(move || cache.scan())
    }

    /// Recursively index existing SVG and PNG files, then mark the cache warm.
    pub fn scan(&self) {
        let mut vectors = Vec::new();
        let mut rasters = Vec::new();
        collect_files(&self.root, &mut vectors, &mut rasters);
        let (svg_count, png_count) = (vectors.len(), rasters.len());

        self.vectors.write().unwrap().extend(vectors);
        self.rasters.write().unwrap().extend(rasters);
        if self.warm.set(()).is_err() {
            debug!("image cache scanned again after warm-up");
        }
        info!(
            "image cache warm: {} svg, {} png under {}",
            svg_count,
            png_count,
            self.root.display()
        );
    }

    /// True once warm-up has completed.
    pub fn is_warm(&self) -> bool {
        self.warm.get().is_some()
    }

    /// Cache path of the ring for `progress` in `style`.
    ///
    /// Progress is clamped to `[0, 100]` and quantized to two decimals.
    pub fn path_for(&self, progress: f64, style: &RingStyle) -> PathBuf {
        let progress = quantize(progress);
        let file_name = format!(
            "sh{}.r{}.{:.2}.{}",
            u8::from(style.shadow),
            u8::from(style.rounded),
            progress,
            SVG_EXTENSION
        );
        self.root.join(style.normalized_color()).join(file_name)
    }

    /// Return the ring image for `progress`, rendering it if needed.
    ///
    /// An existing file is never rewritten. Concurrent misses for the same
    /// key may both render; the content is identical.
    pub fn get(&self, progress: f64, style: &RingStyle) -> Result<PathBuf, ImageError> {
        let path = self.path_for(progress, style);

        match self.lookup(&self.vectors, &path) {
            Lookup::Hit => return Ok(path),
            Lookup::Unknown if path.exists() => {
                self.vectors.write().unwrap().insert(path.clone());
                return Ok(path);
            }
            Lookup::Unknown | Lookup::Miss => {}
        }

        let svg = svg::progress_ring(quantize(progress), style);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, svg)?;
        debug!("rendered {}", path.display());

        self.vectors.write().unwrap().insert(path.clone());
        Ok(path)
    }

    /// PNG rendition of the SVG at `path`, cropped and mirrored for tray
    /// consumers.
    ///
    /// The result is written through to `<path>.png`; later calls read it
    /// back. Failing to write the cached copy is logged but does not fail
    /// the call.
    pub fn rasterize(&self, path: &Path) -> Result<Vec<u8>, ImageError> {
        let png_path = raster_path(path);

        let cached = match self.lookup(&self.rasters, &png_path) {
            Lookup::Hit => true,
            Lookup::Unknown => png_path.exists(),
            Lookup::Miss => false,
        };
        if cached {
            match fs::read(&png_path) {
                Ok(bytes) => {
                    self.rasters.write().unwrap().insert(png_path);
                    return Ok(bytes);
                }
                Err(err) => warn!("reading png cache {}: {}", png_path.display(), err),
            }
        }

        let bytes = raster::render_png(path)?;
        match fs::write(&png_path, &bytes) {
            Ok(()) => {
                self.rasters.write().unwrap().insert(png_path);
            }
            Err(err) => warn!("writing png cache {}: {}", png_path.display(), err),
        }

        Ok(bytes)
    }

    fn lookup(&self, set: &RwLock<HashSet<PathBuf>>, path: &Path) -> Lookup {
        if set.read().unwrap().contains(path) {
            Lookup::Hit
        } else if self.is_warm() {
            Lookup::Miss
        } else {
            Lookup::Unknown
        }
    }
}

/// Sibling PNG path for an SVG path: the full file name plus `.png`.
pub fn raster_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(PNG_EXTENSION);
    PathBuf::from(name)
}

fn quantize(progress: f64) -> f64 {
    if !progress.is_finite() {
        return 0.0;
    }
    (progress.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

fn collect_files(dir: &Path, vectors: &mut Vec<PathBuf>, rasters: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("skipping {}: {}", dir.display(), err);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            collect_files(&path, vectors, rasters);
            continue;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(SVG_EXTENSION) => vectors.push(path),
            Some(PNG_EXTENSION) => rasters.push(path),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(shadow: bool, rounded: bool) -> RingStyle {
        RingStyle {
            color: "#3584e4".to_string(),
            shadow,
            rounded,
        }
    }

    #[test]
    fn path_encodes_style_and_quantized_progress() {
        let cache = ImageCache::new("/tmp/rings");
        assert_eq!(
            cache.path_for(42.004, &style(true, false)),
            PathBuf::from("/tmp/rings/3584E4/sh1.r0.42.00.svg")
        );
        assert_eq!(
            cache.path_for(150.0, &style(false, true)),
            PathBuf::from("/tmp/rings/3584E4/sh0.r1.100.00.svg")
        );
        assert_eq!(
            cache.path_for(-3.0, &style(false, false)),
            PathBuf::from("/tmp/rings/3584E4/sh0.r0.0.00.svg")
        );
    }

    #[test]
    fn repeated_get_returns_same_path_without_rewriting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = ImageCache::new(dir.path());
        let style = style(false, false);

        let first = cache.get(12.5, &style).expect("first get");
        let modified = fs::metadata(&first).expect("metadata").modified().expect("mtime");
        std::thread::sleep(std::time::Duration::from_millis(20));
        let second = cache.get(12.5, &style).expect("second get");

        assert_eq!(first, second);
        let again = fs::metadata(&second).expect("metadata").modified().expect("mtime");
        assert_eq!(modified, again);
    }

    #[test]
    fn cold_cache_trusts_existing_files_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = ImageCache::new(dir.path());
        let style = style(false, false);
        let path = cache.path_for(30.0, &style);
        fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
        fs::write(&path, "prerendered").expect("write");

        assert!(!cache.is_warm());
        let found = cache.get(30.0, &style).expect("get");
        assert_eq!(found, path);
        assert_eq!(fs::read_to_string(&path).expect("read"), "prerendered");
    }

    #[test]
    fn warm_up_indexes_nested_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("FF0000");
        fs::create_dir_all(&nested).expect("mkdir");
        fs::write(nested.join("sh0.r0.10.00.svg"), "svg").expect("write");
        fs::write(nested.join("sh0.r0.10.00.svg.png"), "png").expect("write");
        fs::write(nested.join("notes.txt"), "ignored").expect("write");

        let cache = Arc::new(ImageCache::new(dir.path()));
        cache.warm_up().join().expect("warm-up thread");

        assert!(cache.is_warm());
        assert!(cache
            .vectors
            .read()
            .unwrap()
            .contains(&nested.join("sh0.r0.10.00.svg")));
        assert!(cache
            .rasters
            .read()
            .unwrap()
            .contains(&nested.join("sh0.r0.10.00.svg.png")));
        assert_eq!(cache.vectors.read().unwrap().len(), 1);
    }

    #[test]
    fn warm_miss_renders_new_ring() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = ImageCache::new(dir.path());
        cache.scan();

        let path = cache.get(50.0, &style(false, true)).expect("get");
        let svg = fs::read_to_string(&path).expect("read");
        assert!(svg.contains("rotate(-87 64 64)"));
        assert!(svg.contains(r##"stroke="#3584e4""##));
    }

    #[test]
    fn scanning_missing_root_still_completes_warm_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = ImageCache::new(dir.path().join("missing"));
        cache.scan();
        assert!(cache.is_warm());
    }

    #[test]
    fn rasterize_writes_through_to_sibling_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = ImageCache::new(dir.path());
        let svg = cache.get(75.0, &style(true, true)).expect("get");

        let png = cache.rasterize(&svg).expect("rasterize");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let sibling = raster_path(&svg);
        assert!(sibling.ends_with("sh1.r1.75.00.svg.png"));
        assert_eq!(fs::read(&sibling).expect("read png"), png);
    }

    #[test]
    fn rasterize_serves_cached_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = ImageCache::new(dir.path());
        let svg = cache.get(5.0, &style(false, false)).expect("get");
        fs::write(raster_path(&svg), b"cached-bytes").expect("write png");

        assert_eq!(cache.rasterize(&svg).expect("rasterize"), b"cached-bytes");
    }

    #[test]
    fn rasterize_missing_svg_fails_without_side_effects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = ImageCache::new(dir.path());
        cache.scan();
        let missing = dir.path().join("nope.svg");

        assert!(matches!(
            cache.rasterize(&missing),
            Err(ImageError::Rasterization(_))
        ));
        assert!(!raster_path(&missing).exists());
    }
}
