//! Property values of the exported interfaces, independent of the wire
//! encoding.

use crate::clock::PlaybackStatus;
use crate::constants::{APP_ID, APP_NAME};

use super::dispatch::PlayerControl;

/// Property value as seen by the dispatch table.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Bool(bool),
    Metadata(Metadata),
}

/// `Metadata` of the single fake track. The track id is constant and added
/// by the transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    pub title: String,
    pub artist: Vec<String>,
    pub art_url: String,
}

/// A named property change, in emission order.
pub type Change = (&'static str, PropValue);

const ROOT_PROPERTIES: [&str; 5] = [
    "Identity",
    "DesktopEntry",
    "CanQuit",
    "CanRaise",
    "HasTrackList",
];

const PLAYER_PROPERTIES: [&str; 8] = [
    "PlaybackStatus",
    "Metadata",
    "CanGoNext",
    "CanGoPrevious",
    "CanPlay",
    "CanPause",
    "CanSeek",
    "CanControl",
];

pub fn root_property(name: &str) -> Option<PropValue> {
    let value = match name {
        "Identity" => PropValue::Str(APP_NAME.to_string()),
        "DesktopEntry" => PropValue::Str(APP_ID.to_string()),
        "CanQuit" => PropValue::Bool(true),
        "CanRaise" | "HasTrackList" => PropValue::Bool(false),
        _ => return None,
    };
    Some(value)
}

pub fn player_property(control: &dyn PlayerControl, name: &str) -> Option<PropValue> {
    let value = match name {
        "PlaybackStatus" => PropValue::Str(control.status().as_str().to_string()),
        "Metadata" => PropValue::Metadata(control.metadata()),
        "CanGoNext" | "CanGoPrevious" | "CanPlay" | "CanPause" | "CanControl" => {
            PropValue::Bool(true)
        }
        "CanSeek" => PropValue::Bool(false),
        _ => return None,
    };
    Some(value)
}

pub fn root_properties() -> Vec<Change> {
    ROOT_PROPERTIES
        .iter()
        .filter_map(|name| root_property(name).map(|value| (*name, value)))
        .collect()
}

pub fn player_properties(control: &dyn PlayerControl) -> Vec<Change> {
    PLAYER_PROPERTIES
        .iter()
        .filter_map(|name| player_property(control, name).map(|value| (*name, value)))
        .collect()
}

/// Changes carried by an immediate play/pause notification.
pub fn status_changes(status: PlaybackStatus) -> Vec<Change> {
    vec![("PlaybackStatus", PropValue::Str(status.as_str().to_string()))]
}

/// Changes carried by a regular pipeline event.
pub fn event_changes(status: PlaybackStatus, metadata: Metadata) -> Vec<Change> {
    vec![
        ("PlaybackStatus", PropValue::Str(status.as_str().to_string())),
        ("Metadata", PropValue::Metadata(metadata)),
    ]
}
