//! arraywatchd — the arraywatch daemon.
//!
//! Assembles the workspace crates into three commands:
//! - `run`: the supervised polling loop publishing into the status store
//! - `check`: a single round printed to stdout, exit code = worst severity
//! - `query`: read one controller's stored status
//!
//! # Usage
//!
//! ```text
//! arraywatchd -c /usr/local/etc/arraywatchd.toml run
//! arraywatchd check ctl1a,ctl1b -m disk,pool -x
//! arraywatchd query --controller ctl1a.example.org
//! ```

pub mod cli;
pub mod commands;
pub mod poller;
pub mod supervisor;

pub use poller::{Poller, SubsystemSource};
pub use supervisor::{RetryDecision, RetryWindow, Supervisor, SupervisorConfig, SupervisorError};
