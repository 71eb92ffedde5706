//! redb table definitions for the status store.

use redb::TableDefinition;

/// Status entries keyed by the encoded controller name (see `StoreKey`).
/// Values are JSON-serialized `StoreEntry` records.
pub const STATUS: TableDefinition<&str, &[u8]> = TableDefinition::new("status");
