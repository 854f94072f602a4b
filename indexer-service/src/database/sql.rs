//! SQL statement constants for the snapshot store

pub const CREATE_MIGRATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL,
    description TEXT NOT NULL
)
"#;

pub const CREATE_KV_ENTRIES_TABLE_SQL: &str = r#"
CREATE TABLE kv_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL, -- json
    expires_at INTEGER NOT NULL, -- unix seconds
    updated_at TEXT NOT NULL
)
"#;

pub const CREATE_KV_EXPIRY_INDEX_SQL: &str =
    "CREATE INDEX idx_kv_entries_expires_at ON kv_entries(expires_at)";

pub const SELECT_SCHEMA_VERSION_SQL: &str = "SELECT MAX(version) FROM schema_migrations";

pub const INSERT_MIGRATION_SQL: &str =
    "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)";

pub const UPSERT_ENTRY_SQL: &str = r#"
INSERT OR REPLACE INTO kv_entries (key, value, expires_at, updated_at)
VALUES (?, ?, ?, ?)
"#;

pub const SELECT_UNEXPIRED_ENTRY_SQL: &str =
    "SELECT key, value, expires_at, updated_at FROM kv_entries WHERE key = ? AND expires_at > ?";

pub const DELETE_EXPIRED_ENTRIES_SQL: &str = "DELETE FROM kv_entries WHERE expires_at <= ?";
