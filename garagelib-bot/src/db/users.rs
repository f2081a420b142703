//! User registry
//!
//! Users are keyed by transport identity (`telegram_id`). Rows are inserted
//! on first contact and never deleted.

use garagelib_common::db::{User, UserId};
use garagelib_common::Result;
use sqlx::{Row, SqlitePool};

/// Register a user; no-op if already known (the stored name is kept)
pub async fn add_user(pool: &SqlitePool, user_id: UserId, name: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO users (telegram_id, name) VALUES (?, ?)")
        .bind(user_id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_user(pool: &SqlitePool, user_id: UserId) -> Result<Option<User>> {
    let row = sqlx::query("SELECT telegram_id, name FROM users WHERE telegram_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| User {
        id: row.get("telegram_id"),
        name: row
            .get::<Option<String>, _>("name")
            .unwrap_or_default(),
    }))
}

/// Every known user id, in registration order
pub async fn list_all_user_ids(pool: &SqlitePool) -> Result<Vec<UserId>> {
    let ids: Vec<Option<i64>> =
        sqlx::query_scalar("SELECT telegram_id FROM users ORDER BY id")
            .fetch_all(pool)
            .await?;

    Ok(ids.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use garagelib_common::db::init_memory_database;

    #[tokio::test]
    async fn test_add_user_is_insert_or_ignore() {
        let pool = init_memory_database().await.unwrap();

        add_user(&pool, 42, "Max").await.unwrap();
        add_user(&pool, 42, "Maxim").await.unwrap();
        add_user(&pool, 7, "Ann").await.unwrap();

        let user = get_user(&pool, 42).await.unwrap().unwrap();
        assert_eq!(user.name, "Max");
        assert_eq!(list_all_user_ids(&pool).await.unwrap(), vec![42, 7]);
        assert!(get_user(&pool, 1).await.unwrap().is_none());
    }
}
