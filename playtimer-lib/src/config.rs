//! Explicit configuration for a timer session.
//!
//! Nothing here is global: the CLI assembles a [`PlayerConfig`] from defaults,
//! an optional JSON file, the environment and flags, then hands it to the
//! session and the image cache.

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::constants::{APP_ID, BASE_FPS, DEFAULT_COLOR, GNOME_FPS};

/// Visual options of the progress ring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RingStyle {
    /// Foreground color, `#RGB` or `#RRGGBB`.
    pub color: String,
    pub shadow: bool,
    pub rounded: bool,
}

impl Default for RingStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            shadow: false,
            rounded: false,
        }
    }
}

impl RingStyle {
    /// Return a style with the given color, falling back to the default
    /// color when the value is not a valid hex color.
    pub fn with_color(mut self, color: &str) -> Self {
        if is_hex_color(color) {
            self.color = color.to_string();
        } else {
            warn!("ignoring invalid color {:?}, using {}", color, DEFAULT_COLOR);
            self.color = DEFAULT_COLOR.to_string();
        }
        self
    }

    /// Color as used for the cache subdirectory: upper case, without `#`.
    pub fn normalized_color(&self) -> String {
        self.color.trim_start_matches('#').to_uppercase()
    }
}

/// Check for `#RGB` or `#RRGGBB`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Desktop environment, as far as the render rate is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Desktop {
    Gnome,
    Plasma,
    Other,
}

impl Desktop {
    /// Detect the desktop from `XDG_CURRENT_DESKTOP`.
    pub fn detect() -> Self {
        match std::env::var("XDG_CURRENT_DESKTOP") {
            Ok(value) => Self::from_env_value(&value),
            Err(_) => Self::Other,
        }
    }

    /// Parse an `XDG_CURRENT_DESKTOP` value, which may be a `:` separated list.
    pub fn from_env_value(value: &str) -> Self {
        for entry in value.split(':') {
            match entry.trim().to_uppercase().as_str() {
                "GNOME" => return Self::Gnome,
                "KDE" => return Self::Plasma,
                _ => {}
            }
        }
        Self::Other
    }
}

/// Error type for configuration file loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "read config: {}", err),
            Self::Parse(err) => write!(f, "parse config: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings for one timer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub style: RingStyle,
    /// Force a 1 fps render rate regardless of the desktop.
    pub low_fps: bool,
    #[serde(skip)]
    pub desktop: Option<Desktop>,
    /// Root of the on-disk image cache. `None` uses [`default_cache_dir`].
    pub cache_dir: Option<PathBuf>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            style: RingStyle::default(),
            low_fps: false,
            desktop: None,
            cache_dir: None,
        }
    }
}

impl PlayerConfig {
    /// Load a configuration from a JSON file. Missing fields use defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&raw)?;
        Ok(config)
    }

    /// Render frames per second for the image loop.
    ///
    /// GNOME animates the player art, so it gets a higher rate than other
    /// desktops. Low fps mode always wins.
    pub fn render_fps(&self) -> u32 {
        let desktop = self.desktop.unwrap_or_else(Desktop::detect);
        let fps = match desktop {
            Desktop::Gnome => GNOME_FPS,
            Desktop::Plasma | Desktop::Other => BASE_FPS,
        };
        if self.low_fps && fps > 1 {
            log::info!("1 fps mode requested");
            return 1;
        }
        fps.max(1)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

/// `$XDG_CACHE_HOME/<app id>`, falling back to `$HOME/.cache/<app id>`.
pub fn default_cache_dir() -> PathBuf {
    let base = match std::env::var_os("XDG_CACHE_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".cache"),
            None => std::env::temp_dir(),
        },
    };
    base.join(APP_ID)
}
