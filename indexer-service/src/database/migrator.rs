//! Versioned schema migrations for the snapshot store

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use super::constants::CURRENT_SCHEMA_VERSION;
use super::sql::{
    CREATE_KV_ENTRIES_TABLE_SQL, CREATE_KV_EXPIRY_INDEX_SQL, CREATE_MIGRATIONS_TABLE_SQL,
    INSERT_MIGRATION_SQL, SELECT_SCHEMA_VERSION_SQL,
};

struct Migration {
    version: i32,
    description: &'static str,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Key-value table for persisted snapshots",
    statements: &[CREATE_KV_ENTRIES_TABLE_SQL, CREATE_KV_EXPIRY_INDEX_SQL],
}];

/// Bring the schema up to [`CURRENT_SCHEMA_VERSION`], applying each pending step in its own transaction
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_MIGRATIONS_TABLE_SQL)
        .execute(pool)
        .await
        .context("creating schema_migrations")?;

    let current = get_current_version(pool).await?;
    if current >= CURRENT_SCHEMA_VERSION {
        debug!("Snapshot store schema is current (v{})", current);
        return Ok(());
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(pool, migration)
            .await
            .with_context(|| format!("migration v{} failed", migration.version))?;
    }
    Ok(())
}

/// Highest applied schema version, 0 for a fresh database
pub async fn get_current_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> = sqlx::query_scalar(SELECT_SCHEMA_VERSION_SQL)
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    info!(
        "Applying snapshot store migration v{}: {}",
        migration.version, migration.description
    );

    let mut tx = pool.begin().await?;
    for statement in migration.statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    sqlx::query(INSERT_MIGRATION_SQL)
        .bind(migration.version)
        .bind(Utc::now().to_rfc3339())
        .bind(migration.description)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_list_matches_schema_version() {
        let last = MIGRATIONS.last().map(|m| m.version).unwrap_or(0);
        assert_eq!(last, CURRENT_SCHEMA_VERSION);
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version < w[1].version));
    }
}
