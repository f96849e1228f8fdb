//! # Play Timer Library
//!
//! Countdown timer core that presents itself as an MPRIS media player on the
//! session bus. It includes the countdown clock, the progress-ring image cache,
//! the change-notification pipeline and the bus service.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod image;
pub mod mpris;
pub mod pipeline;
pub mod player;
pub mod subscribers;
