//! Versioned schema migrations
//!
//! Applied after column sync. Each migration runs once, is recorded in
//! `schema_version`, and must be safe to re-run against a database where
//! its effect is already present.
//!
//! Never edit a released migration; add a new `migrate_vN` instead.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Highest migration this build knows about
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Latest applied migration, 0 when none
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({}); continuing",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: lookup indexes for catalog listings
///
/// Personal catalog and artist lists filter by owner; the common playlist
/// filters by `is_common` and sorts by `created_at`.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: catalog indexes");

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_tracks_user ON tracks(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_tracks_common ON tracks(is_common, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_artists_user ON artists(user_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}

/// Migration v2: normalize visibility flags
///
/// Rows inserted before `is_common` had a default carry NULL, which the
/// common playlist query would otherwise skip silently.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: normalize NULL is_common");

    let result = sqlx::query("UPDATE tracks SET is_common = 0 WHERE is_common IS NULL")
        .execute(pool)
        .await?;

    if result.rows_affected() > 0 {
        info!("  ✓ Marked {} legacy tracks as personal", result.rows_affected());
    }

    Ok(())
}
