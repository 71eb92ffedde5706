//! Inspection error types.

use thiserror::Error;

pub type InspectResult<T> = Result<T, InspectError>;

/// Errors raised while talking to an inspection endpoint or validating
/// check names.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("connection to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("listing {kind} objects failed: {reason}")]
    Query { kind: String, reason: String },

    #[error("unrecognized check: {0} (known checks: {known})", known = crate::catalog::CheckKind::known_names())]
    UnknownCheck(String),

    #[error("invalid inventory document {path}: {reason}")]
    Document { path: String, reason: String },
}
