//! arraywatch-core — shared types for the arraywatch health poller.
//!
//! Holds the four-level [`Severity`] scale, the subsystem records read
//! from the subsystem list, and the daemon settings file.

pub mod error;
pub mod settings;
pub mod severity;
pub mod subsystems;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use settings::DaemonSettings;
pub use severity::{Severity, SeverityCounts};
pub use types::*;
