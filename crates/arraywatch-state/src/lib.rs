//! arraywatch-state — the timestamped status store.
//!
//! Backed by [redb](https://docs.rs/redb). Each controller has one
//! [`StoreEntry`] (status code, message, timestamp) under a key derived
//! from its name by [`StoreKey::encode`]. The polling daemon is the only
//! writer; a polling-protocol agent reads entries between rounds.
//!
//! # Staleness
//!
//! An entry older than the expected refresh interval is degraded by the
//! [`StalenessMonitor`]: an OK status becomes WARNING and the message is
//! wrapped as `TIMED OUT. Last state: <message>`. The wrap never nests.
//!
//! The `StatusStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod staleness;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use staleness::{Staleness, StalenessMonitor, TIMED_OUT_PREFIX};
pub use store::StatusStore;
pub use types::*;
