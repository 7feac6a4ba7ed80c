use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA cache_size = -32000;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

// `sub_kind` is '' for item types without a sub-partition, so the UNIQUE
// indexes cover every row (NULL would make each row distinct). `name_norm`
// holds the case-normalized name; the indexes on it and on order_value are
// the database backstop for the partition invariants, turning lost races
// into constraint violations the executor can report per item.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS tenants (
    tenant_id BLOB PRIMARY KEY CHECK (length(tenant_id) = 16),
    display_name TEXT NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (unixepoch())
);

CREATE TABLE IF NOT EXISTS standard_items (
    standard_item_id BLOB PRIMARY KEY CHECK (length(standard_item_id) = 16),
    item_type TEXT NOT NULL,
    sub_kind TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL,
    order_value INTEGER NOT NULL,
    color TEXT,
    type_fields BLOB NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (unixepoch())
);
CREATE INDEX IF NOT EXISTS idx_standard_type_order ON standard_items (item_type, sub_kind, order_value);

CREATE TABLE IF NOT EXISTS tenant_items (
    tenant_item_id BLOB PRIMARY KEY CHECK (length(tenant_item_id) = 16),
    tenant_id BLOB NOT NULL CHECK (length(tenant_id) = 16) REFERENCES tenants (tenant_id),
    item_type TEXT NOT NULL,
    sub_kind TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL,
    name_norm TEXT NOT NULL,
    order_value INTEGER NOT NULL,
    color TEXT,
    type_fields BLOB NOT NULL,
    reference_id BLOB CHECK (reference_id IS NULL OR length(reference_id) = 16),
    is_protected INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT (unixepoch())
);
CREATE INDEX IF NOT EXISTS idx_tenant_items_partition ON tenant_items (tenant_id, item_type, sub_kind);
CREATE UNIQUE INDEX IF NOT EXISTS uq_tenant_items_name ON tenant_items (tenant_id, item_type, sub_kind, name_norm);
CREATE UNIQUE INDEX IF NOT EXISTS uq_tenant_items_order ON tenant_items (tenant_id, item_type, sub_kind, order_value);
CREATE UNIQUE INDEX IF NOT EXISTS uq_tenant_items_reference ON tenant_items (tenant_id, reference_id) WHERE reference_id IS NOT NULL;
";
