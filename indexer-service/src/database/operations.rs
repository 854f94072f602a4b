use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use super::models::KvEntry;
use super::sql::{DELETE_EXPIRED_ENTRIES_SQL, SELECT_UNEXPIRED_ENTRY_SQL, UPSERT_ENTRY_SQL};

impl KvEntry {
    pub async fn upsert(&self, pool: &SqlitePool) -> Result<()> {
        debug!(
            "Writing kv entry '{}' ({} bytes, expires_at={})",
            self.key,
            self.value.len(),
            self.expires_at
        );

        sqlx::query(UPSERT_ENTRY_SQL)
            .bind(&self.key)
            .bind(&self.value)
            .bind(self.expires_at)
            .bind(&self.updated_at)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Entry for `key` if it expires after `now` (unix seconds)
    pub async fn get_unexpired(pool: &SqlitePool, key: &str, now: i64) -> Result<Option<KvEntry>> {
        let entry = sqlx::query_as::<_, KvEntry>(SELECT_UNEXPIRED_ENTRY_SQL)
            .bind(key)
            .bind(now)
            .fetch_optional(pool)
            .await?;
        Ok(entry)
    }

    /// Drop every entry that expired at or before `now`; returns the number removed
    pub async fn purge_expired(pool: &SqlitePool, now: i64) -> Result<u64> {
        let done = sqlx::query(DELETE_EXPIRED_ENTRIES_SQL)
            .bind(now)
            .execute(pool)
            .await?;
        Ok(done.rows_affected())
    }
}
