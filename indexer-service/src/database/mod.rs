//! Best-effort persistence of the latest snapshot in a SQLite key-value table

pub mod constants;
pub mod migrator;
pub mod models;
pub mod operations;
pub mod path;
pub mod sql;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

pub use migrator::run_migrations;
pub use path::StoreLocation;

use crate::snapshot::Snapshot;
use constants::SNAPSHOT_KEY;
use models::KvEntry;

/// Snapshot persistence that survives restarts. Entries expire after `ttl`.
#[derive(Clone)]
pub struct SnapshotStore {
    pool: SqlitePool,
    location: StoreLocation,
    ttl: Duration,
}

impl SnapshotStore {
    /// Open (creating if needed) the store and run migrations
    pub async fn open(db_path: &str, ttl: Duration) -> Result<Self> {
        let location = StoreLocation::parse(db_path)?;
        info!("Opening snapshot store at {}", location.display_path());

        let pool = match &location {
            // Every in-memory connection is its own database; pin to one that never recycles.
            StoreLocation::Memory => {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect(constants::MEMORY_URL)
                    .await?
            }
            StoreLocation::File(path) => {
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true);
                SqlitePoolOptions::new().connect_with(options).await?
            }
        };

        run_migrations(&pool).await?;

        Ok(Self {
            pool,
            location,
            ttl,
        })
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Latest persisted snapshot, if one exists and hasn't expired
    pub async fn load(&self) -> Result<Option<Snapshot>> {
        let now = Utc::now().timestamp();
        let Some(entry) = KvEntry::get_unexpired(&self.pool, SNAPSHOT_KEY, now).await? else {
            debug!("No unexpired snapshot in store");
            return Ok(None);
        };
        let snapshot: Snapshot =
            serde_json::from_str(&entry.value).context("persisted snapshot is not valid JSON")?;
        Ok(Some(snapshot))
    }

    pub async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let now = Utc::now();
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let entry = KvEntry {
            key: SNAPSHOT_KEY.to_string(),
            value: serde_json::to_string(snapshot)?,
            expires_at: now.timestamp().saturating_add(ttl_secs),
            updated_at: now.to_rfc3339(),
        };
        entry.upsert(&self.pool).await?;

        let purged = KvEntry::purge_expired(&self.pool, now.timestamp()).await?;
        if purged > 0 {
            debug!("Purged {} expired kv entries", purged);
        }
        Ok(())
    }
}
