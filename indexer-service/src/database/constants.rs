//! Snapshot store constants

/// Schema version the migrator brings a database up to
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Key under which the latest snapshot is stored
pub const SNAPSHOT_KEY: &str = "snapshot";

/// Connection string used for `:memory:` stores
pub const MEMORY_URL: &str = "sqlite::memory:";
