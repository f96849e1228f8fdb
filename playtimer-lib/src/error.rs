use std::fmt::{Display, Formatter};

/// Error type for session construction, bus setup and signal emission.
#[derive(Debug)]
pub enum PlayerError {
    /// The requested duration (seconds) was zero or negative.
    InvalidDuration(i64),
    /// The session bus could not be reached.
    BusConnection(String),
    /// The per-run service name could not be owned as primary owner.
    NameOwnership(String),
    /// The player object could not be exported.
    Export(String),
    /// A signal could not be written to the bus.
    Emit(String),
}

impl Display for PlayerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDuration(seconds) => {
                write!(f, "invalid duration: {} seconds, must be positive", seconds)
            }
            Self::BusConnection(err) => write!(f, "connect to session bus: {}", err),
            Self::NameOwnership(err) => write!(f, "request bus name: {}", err),
            Self::Export(err) => write!(f, "export interfaces: {}", err),
            Self::Emit(err) => write!(f, "emit signal: {}", err),
        }
    }
}

impl std::error::Error for PlayerError {}
