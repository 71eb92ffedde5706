//! StatusStore — redb-backed persistence for published statuses.
//!
//! Writes replace the whole entry. A report for a redundant subsystem is
//! written under every controller key in one transaction, so readers
//! addressing either controller see the same status. Both on-disk and
//! in-memory backends are supported (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::STATUS;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe status store backed by redb.
#[derive(Clone)]
pub struct StatusStore {
    db: Arc<Database>,
}

impl StatusStore {
    /// Open (or create) a persistent status store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "status store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory status store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory status store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(STATUS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Replace the entry stored under `key`.
    pub fn put(&self, key: &StoreKey, entry: &StoreEntry) -> StateResult<()> {
        let value = serde_json::to_vec(entry).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(STATUS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, status = entry.status, "status entry stored");
        Ok(())
    }

    /// Store the same entry under every controller's key atomically.
    pub fn write_report<S: AsRef<str>>(
        &self,
        controllers: &[S],
        entry: &StoreEntry,
    ) -> StateResult<()> {
        let value = serde_json::to_vec(entry).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(STATUS).map_err(map_err!(Table))?;
            for controller in controllers {
                let key = StoreKey::encode(controller.as_ref());
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            controllers = controllers.len(),
            status = entry.status,
            "report stored"
        );
        Ok(())
    }

    /// Point read by key.
    pub fn get(&self, key: &StoreKey) -> StateResult<Option<StoreEntry>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(STATUS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let entry: StoreEntry =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Point read by controller name.
    pub fn get_controller(&self, controller: &str) -> StateResult<Option<StoreEntry>> {
        self.get(&StoreKey::encode(controller))
    }

    /// List every stored entry in key order.
    pub fn list(&self) -> StateResult<Vec<(StoreKey, StoreEntry)>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(STATUS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            let parsed: StoreEntry =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push((StoreKey::from_encoded(key.value())?, parsed));
        }
        Ok(results)
    }

    /// Split a polling-protocol object id of the form
    /// `<base>.<encoded key>.<field>` into the key and column it addresses.
    ///
    /// Returns `Ok(None)` when the id is outside `base` or names an unknown
    /// field. Readers go through [`StalenessMonitor::get_field`], which
    /// applies the staleness view to the entry before picking the column.
    ///
    /// [`StalenessMonitor::get_field`]: crate::StalenessMonitor::get_field
    pub fn resolve_oid(base: &str, oid: &str) -> StateResult<Option<(StoreKey, StatusField)>> {
        let Some(rest) = oid
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            return Ok(None);
        };
        let Some((encoded, suffix)) = rest.rsplit_once('.') else {
            return Ok(None);
        };
        let Some(field) = StatusField::from_suffix(suffix) else {
            return Ok(None);
        };
        Ok(Some((StoreKey::from_encoded(encoded)?, field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arraywatch_core::Severity;

    const BASE: &str = ".1.3.6.1.4.1.341.49.1";

    #[test]
    fn put_and_get() {
        let store = StatusStore::open_in_memory().unwrap();
        let key = StoreKey::encode("ctl1a");
        let entry = StoreEntry::new(Severity::Warning, "FAN: WARNING", 1000);

        store.put(&key, &entry).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(entry));
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let store = StatusStore::open_in_memory().unwrap();
        assert!(store.get_controller("nobody").unwrap().is_none());
    }

    #[test]
    fn put_replaces_whole_entry() {
        let store = StatusStore::open_in_memory().unwrap();
        let key = StoreKey::encode("ctl1a");
        store
            .put(&key, &StoreEntry::new(Severity::Critical, "old", 1000))
            .unwrap();
        store
            .put(&key, &StoreEntry::new(Severity::Ok, "All Checks OK", 2000))
            .unwrap();

        let entry = store.get(&key).unwrap().unwrap();
        assert_eq!(entry.severity(), Severity::Ok);
        assert_eq!(entry.message, "All Checks OK");
        assert_eq!(entry.timestamp, 2000);
    }

    #[test]
    fn write_report_covers_both_controllers() {
        let store = StatusStore::open_in_memory().unwrap();
        let entry = StoreEntry::new(Severity::Critical, "DISK DRIVE: 1 Check CRITICAL", 1000);

        store.write_report(&["ctl1a", "ctl1b"], &entry).unwrap();

        assert_eq!(store.get_controller("ctl1a").unwrap(), Some(entry.clone()));
        assert_eq!(store.get_controller("ctl1b").unwrap(), Some(entry));
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn resolve_oid_splits_key_and_field() {
        let oid = |field: &str| format!("{BASE}.3.97.98.99.{field}");
        assert_eq!(
            StatusStore::resolve_oid(BASE, &oid("2")).unwrap(),
            Some((StoreKey::encode("abc"), StatusField::Message))
        );
        assert_eq!(StatusStore::resolve_oid(BASE, &oid("9")).unwrap(), None);
        assert_eq!(StatusStore::resolve_oid(".1.2.3", &oid("1")).unwrap(), None);
        assert!(StatusStore::resolve_oid(BASE, &format!("{BASE}.4.97.1")).is_err());
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("status.redb");

        {
            let store = StatusStore::open(&db_path).unwrap();
            store
                .write_report(&["ctl9"], &StoreEntry::new(Severity::Ok, "All Checks OK", 10))
                .unwrap();
        }

        let store = StatusStore::open(&db_path).unwrap();
        let entry = store.get_controller("ctl9").unwrap().unwrap();
        assert_eq!(entry.message, "All Checks OK");
    }
}
