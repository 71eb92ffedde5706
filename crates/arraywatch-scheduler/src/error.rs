//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur while resolving targets or configuring a round.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to resolve {name}: {source}")]
    Resolve {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} resolved to no addresses")]
    NoAddresses(String),

    #[error("invalid round configuration: {0}")]
    InvalidConfig(String),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
