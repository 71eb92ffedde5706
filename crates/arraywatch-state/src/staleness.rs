//! Staleness detection for published statuses.
//!
//! An entry is stale once `now > timestamp + interval`. A stale entry is
//! degraded: OK becomes WARNING, an unparsable status becomes UNKNOWN, and
//! the message becomes `TIMED OUT. Last state: <last real message>`.
//!
//! The degraded entry keeps its original timestamp, so it stays stale until
//! a real round overwrites it. Degrading is idempotent: an already-wrapped
//! message is unwrapped before being wrapped again.

use std::time::Duration;

use tracing::{debug, warn};

use arraywatch_core::Severity;

use crate::error::StateResult;
use crate::store::StatusStore;
use crate::types::{FieldValue, StoreEntry, StoreKey};

/// Marker prepended to the message of a stale entry.
pub const TIMED_OUT_PREFIX: &str = "TIMED OUT. Last state: ";

/// Message used when a stale entry has no message at all.
const NO_MESSAGE: &str = "No message recorded";

/// Result of checking one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// No entry has been written for this key yet.
    Missing,
    Fresh,
    /// The entry was stale and has been rewritten to the contained value.
    Stale(StoreEntry),
}

#[derive(Debug, Clone, Copy)]
pub struct StalenessMonitor {
    interval: Duration,
}

impl StalenessMonitor {
    /// `interval` is the age after which an entry counts as stale.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn is_stale(&self, entry: &StoreEntry, now: u64) -> bool {
        now > entry.timestamp.saturating_add(self.interval.as_secs())
    }

    /// Check one key and rewrite it in place if stale.
    pub fn check(&self, store: &StatusStore, key: &StoreKey, now: u64) -> StateResult<Staleness> {
        let Some(entry) = store.get(key)? else {
            return Ok(Staleness::Missing);
        };
        if !self.is_stale(&entry, now) {
            return Ok(Staleness::Fresh);
        }

        let degraded = degrade(&entry);
        store.put(key, &degraded)?;
        warn!(
            %key,
            age_secs = now.saturating_sub(entry.timestamp),
            status = degraded.status,
            "stale status entry degraded"
        );
        Ok(Staleness::Stale(degraded))
    }

    /// Check every controller's key. Returns how many entries were degraded.
    pub fn sweep<I, S>(&self, store: &StatusStore, controllers: I, now: u64) -> StateResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut degraded = 0;
        for controller in controllers {
            let key = StoreKey::encode(controller.as_ref());
            if let Staleness::Stale(_) = self.check(store, &key, now)? {
                degraded += 1;
            }
        }
        debug!(degraded, "staleness sweep finished");
        Ok(degraded)
    }

    /// What an external reader should see for `entry` at `now`, without
    /// writing anything back.
    pub fn view(&self, entry: &StoreEntry, now: u64) -> StoreEntry {
        if self.is_stale(entry, now) {
            degrade(entry)
        } else {
            entry.clone()
        }
    }

    /// Read one polling-protocol column through the staleness view.
    ///
    /// `Ok(None)` when the id is not addressable or the key has no entry.
    pub fn get_field(
        &self,
        store: &StatusStore,
        base: &str,
        oid: &str,
        now: u64,
    ) -> StateResult<Option<FieldValue>> {
        let Some((key, field)) = StatusStore::resolve_oid(base, oid)? else {
            return Ok(None);
        };
        Ok(store
            .get(&key)?
            .map(|entry| self.view(&entry, now).field(field)))
    }
}

/// Degrade an entry that missed its refresh. Keeps the timestamp.
pub fn degrade(entry: &StoreEntry) -> StoreEntry {
    let mut status = match Severity::from_code(entry.status) {
        None => Severity::Unknown,
        Some(Severity::Ok) => Severity::Warning,
        Some(other) => other,
    };

    let mut last_state = entry.message.as_str();
    while let Some(inner) = last_state.strip_prefix(TIMED_OUT_PREFIX) {
        last_state = inner;
    }
    if entry.message.is_empty() {
        last_state = NO_MESSAGE;
        status = Severity::Unknown;
    }

    StoreEntry {
        status: status.code(),
        message: format!("{TIMED_OUT_PREFIX}{last_state}"),
        timestamp: entry.timestamp,
    }
}
