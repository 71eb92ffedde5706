//! arraywatch-health — per-target health checks and severity aggregation.
//!
//! # Architecture
//!
//! ```text
//! CheckPlan (validated once at startup)
//!   ├── Inspector::connect(target) → Session
//!   ├── per CheckKind: ComponentCheck::run(session) → CheckReport
//!   │     └── Classifier (sticky CRITICAL, per-severity counts,
//!   │                     detail-line budget in compact mode)
//!   └── CheckOutcome ──aggregate()──▶ Report (production policy, message)
//! ```
//!
//! A failing check never aborts the task: inspection errors and panics
//! inside one check become an UNKNOWN [`CheckReport`] for that check.
//! Failures that prevent checking a target at all (connection, deadline,
//! resolution) are carried as [`TaskFailure`] and always report UNKNOWN.

pub mod aggregate;
pub mod catalog;
pub mod check;
pub mod error;
pub mod inspect;
pub mod inventory;
pub mod outcome;
pub mod plan;

pub use aggregate::{ALL_CHECKS_OK, Report, aggregate, overall_severity};
pub use catalog::CheckKind;
pub use check::{CheckOptions, ComponentCheck, HealthStateCheck};
pub use error::{InspectError, InspectResult};
pub use inspect::{AttrValue, InspectedObject, Inspector, Session};
pub use inventory::{FileInspector, Inventory, MemoryInspector};
pub use outcome::{CheckOutcome, CheckReport, TaskFailure, TaskResult};
pub use plan::CheckPlan;
