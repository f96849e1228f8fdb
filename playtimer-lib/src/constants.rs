//! Shared constants for identity, bus naming and timing defaults.

use std::time::Duration;

/// Reverse-DNS application identifier, also used as the desktop entry name.
pub const APP_ID: &str = "io.github.playtimer.play-timer";

/// Human readable player identity.
pub const APP_NAME: &str = "Play Timer";

/// Prefix shared by every MPRIS service name.
pub const MPRIS_NAME_PREFIX: &str = "org.mpris.MediaPlayer2";

/// Object path all interfaces are exported at.
pub const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

/// Constant track identifier reported in `Metadata`.
pub const TRACK_ID: &str = "/track/1";

pub const ROOT_INTERFACE: &str = "org.mpris.MediaPlayer2";
pub const PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
pub const INTROSPECTABLE_INTERFACE: &str = "org.freedesktop.DBus.Introspectable";

/// Logic tick interval for regular timers.
pub const BASE_INTERVAL: Duration = Duration::from_millis(5);

/// Timers longer than this tick at a coarser interval.
pub const LOW_PRECISION_AFTER: Duration = Duration::from_secs(300);

/// Render rate under GNOME Shell, which animates the art smoothly.
pub const GNOME_FPS: u32 = 30;

/// Render rate everywhere else.
pub const BASE_FPS: u32 = 1;

/// Default foreground ring color.
pub const DEFAULT_COLOR: &str = "#3584E4";
