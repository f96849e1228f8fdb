//! MPRIS surface of the timer.
//!
//! [`Dispatcher`] routes calls without knowing about the transport,
//! [`PlayerService`] applies replies and turns pipeline events into
//! `PropertiesChanged` signals, and an [`Endpoint`] carries both over a bus.
//! [`SessionBus`] is the D-Bus session bus endpoint.

mod bus;
mod dispatch;
mod properties;
mod service;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::error::PlayerError;

pub use bus::{service_name, SessionBus};
pub use dispatch::{Call, CallArgs, Dispatcher, PlayerControl, Reply};
pub use properties::{Change, Metadata, PropValue};
pub use service::PlayerService;

/// Transport that exposes a [`PlayerService`] to remote callers.
pub trait Endpoint: Send + Sync {
    /// Well-known name the player is reachable under.
    fn service_name(&self) -> String;

    /// Start delivering inbound calls to `service`.
    fn serve(&self, service: Arc<PlayerService>) -> Result<(), PlayerError>;

    /// Emit `PropertiesChanged(interface, changes, [])`.
    fn emit_properties_changed(&self, interface: &str, changes: &[Change])
        -> Result<(), PlayerError>;

    /// Release the name and stop serving. Called once per session.
    fn close(&self);
}
