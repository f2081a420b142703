//! Bot metadata, announcement markers and the notification log

use garagelib_common::db::UserId;
use garagelib_common::Result;
use sqlx::SqlitePool;

const BOT_VERSION_KEY: &str = "version";

pub async fn get_stored_bot_version(pool: &SqlitePool) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM bot_meta WHERE key = ?")
            .bind(BOT_VERSION_KEY)
            .fetch_optional(pool)
            .await?;

    Ok(value.flatten())
}

pub async fn set_stored_bot_version(pool: &SqlitePool, version: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO bot_meta (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(BOT_VERSION_KEY)
    .bind(version)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn has_version_been_announced(pool: &SqlitePool, version: &str) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sent_updates WHERE version = ?)")
            .bind(version)
            .fetch_one(pool)
            .await?;

    Ok(exists)
}

/// Record that `version` was announced.
///
/// Returns true only for the call that inserted the marker.
pub async fn mark_version_announced(pool: &SqlitePool, version: &str) -> Result<bool> {
    let result = sqlx::query("INSERT OR IGNORE INTO sent_updates (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Append to the notification log
pub async fn add_notification(pool: &SqlitePool, user_id: UserId, message: &str) -> Result<()> {
    sqlx::query("INSERT INTO notifications (user_id, message) VALUES (?, ?)")
        .bind(user_id)
        .bind(message)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use garagelib_common::db::init_memory_database;

    #[tokio::test]
    async fn test_stored_version_upsert() {
        let pool = init_memory_database().await.unwrap();
        assert_eq!(get_stored_bot_version(&pool).await.unwrap(), None);

        set_stored_bot_version(&pool, "v1.1").await.unwrap();
        set_stored_bot_version(&pool, "v1.2").await.unwrap();

        assert_eq!(
            get_stored_bot_version(&pool).await.unwrap().as_deref(),
            Some("v1.2")
        );
    }

    #[tokio::test]
    async fn test_mark_version_announced_only_first_time() {
        let pool = init_memory_database().await.unwrap();

        assert!(!has_version_been_announced(&pool, "v1.1").await.unwrap());
        assert!(mark_version_announced(&pool, "v1.1").await.unwrap());
        assert!(!mark_version_announced(&pool, "v1.1").await.unwrap());
        assert!(has_version_been_announced(&pool, "v1.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_notification_log() {
        let pool = init_memory_database().await.unwrap();
        add_notification(&pool, 42, "🎵 Max released a new track: «Demo»")
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = 42")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
