//! Artist identity cards
//!
//! A card belongs to exactly one user. Names are stored truncated to
//! `ARTIST_NAME_MAX_CHARS` characters.

use garagelib_common::db::{truncate_artist_name, ArtistId, ArtistIdentity, UserId};
use garagelib_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn artist_from_row(row: &SqliteRow) -> ArtistIdentity {
    ArtistIdentity {
        id: row.get("id"),
        user_id: row.get::<Option<i64>, _>("user_id").unwrap_or_default(),
        name: row.get::<Option<String>, _>("name").unwrap_or_default(),
    }
}

/// Create a card and return its id
pub async fn add_artist(pool: &SqlitePool, user_id: UserId, name: &str) -> Result<ArtistId> {
    let result = sqlx::query("INSERT INTO artists (user_id, name) VALUES (?, ?)")
        .bind(user_id)
        .bind(truncate_artist_name(name))
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_artist(pool: &SqlitePool, artist_id: ArtistId) -> Result<Option<ArtistIdentity>> {
    let row = sqlx::query("SELECT id, user_id, name FROM artists WHERE id = ?")
        .bind(artist_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(artist_from_row))
}

/// A user's cards, oldest first
pub async fn list_artists_for_user(pool: &SqlitePool, user_id: UserId) -> Result<Vec<ArtistIdentity>> {
    let rows = sqlx::query("SELECT id, user_id, name FROM artists WHERE user_id = ? ORDER BY id")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(artist_from_row).collect())
}

/// Every card, alphabetically
pub async fn list_all_artists(pool: &SqlitePool) -> Result<Vec<ArtistIdentity>> {
    let rows = sqlx::query("SELECT id, user_id, name FROM artists ORDER BY name ASC, id ASC")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(artist_from_row).collect())
}

/// Return the user's first card, creating one from `fallback_name` if the
/// user has none.
///
/// The insert is conditional on the user owning no card, so two racing
/// callers cannot both create one. A blank fallback becomes
/// `artist_<user id>`.
pub async fn get_or_create_default_artist(
    pool: &SqlitePool,
    user_id: UserId,
    fallback_name: &str,
) -> Result<ArtistIdentity> {
    let fallback = fallback_name.trim();
    let name = if fallback.is_empty() {
        format!("artist_{}", user_id)
    } else {
        truncate_artist_name(fallback)
    };

    sqlx::query(
        r#"
        INSERT INTO artists (user_id, name)
        SELECT ?, ?
        WHERE NOT EXISTS (SELECT 1 FROM artists WHERE user_id = ?)
        "#,
    )
    .bind(user_id)
    .bind(&name)
    .bind(user_id)
    .execute(pool)
    .await?;

    let row = sqlx::query(
        "SELECT id, user_id, name FROM artists WHERE user_id = ? ORDER BY id LIMIT 1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(artist_from_row(&row))
}

/// Delete a card owned by `user_id`; false if no such card
pub async fn delete_artist(pool: &SqlitePool, artist_id: ArtistId, user_id: UserId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM artists WHERE id = ? AND user_id = ?")
        .bind(artist_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garagelib_common::db::{init_memory_database, ARTIST_NAME_MAX_CHARS};

    #[tokio::test]
    async fn test_default_artist_created_once() {
        let pool = init_memory_database().await.unwrap();

        let first = get_or_create_default_artist(&pool, 42, "Max").await.unwrap();
        let second = get_or_create_default_artist(&pool, 42, "Someone Else").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name, "Max");
        assert_eq!(list_artists_for_user(&pool, 42).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_default_artist_name_fallbacks() {
        let pool = init_memory_database().await.unwrap();

        let blank = get_or_create_default_artist(&pool, 42, "   ").await.unwrap();
        assert_eq!(blank.name, "artist_42");

        let long = get_or_create_default_artist(&pool, 7, &"x".repeat(300)).await.unwrap();
        assert_eq!(long.name.chars().count(), ARTIST_NAME_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_delete_artist_is_owner_scoped() {
        let pool = init_memory_database().await.unwrap();
        let id = add_artist(&pool, 42, "Max").await.unwrap();

        assert!(!delete_artist(&pool, id, 7).await.unwrap());
        assert!(get_artist(&pool, id).await.unwrap().is_some());

        assert!(delete_artist(&pool, id, 42).await.unwrap());
        assert!(get_artist(&pool, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_artists_sorted_by_name() {
        let pool = init_memory_database().await.unwrap();
        add_artist(&pool, 1, "Zed").await.unwrap();
        add_artist(&pool, 2, "Ann").await.unwrap();

        let names: Vec<String> = list_all_artists(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Ann", "Zed"]);
    }
}
