//! arraywatch-scheduler — target resolution and the fan-out round.
//!
//! One round turns the configured subsystems into per-target reports:
//!
//! ```text
//! Scheduler::run_round(subsystems)
//!   ├── HostResolver (static table, then system DNS; first controller wins)
//!   ├── JoinSet + Semaphore (at most `max_workers` targets in flight)
//!   │     └── spawn_blocking(CheckPlan::run_checks)
//!   ├── round deadline (outstanding tasks aborted, reported as timed out)
//!   └── aggregate() per target, in configuration order
//! ```
//!
//! Rounds never overlap; the caller awaits one before starting the next.

pub mod error;
pub mod resolver;
pub mod scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use resolver::HostResolver;
pub use scheduler::{RoundConfig, Scheduler};
