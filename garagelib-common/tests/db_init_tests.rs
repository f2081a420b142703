//! On-disk database initialization tests

use garagelib_common::db::{
    get_schema_version, init_database, introspect_table, CURRENT_SCHEMA_VERSION,
};
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

#[tokio::test]
async fn test_init_database_creates_file_and_parent_dir() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("garagelib.db");

    let pool = init_database(&db_path).await.unwrap();

    assert!(db_path.exists());
    assert_eq!(
        get_schema_version(&pool).await.unwrap(),
        CURRENT_SCHEMA_VERSION
    );
}

#[tokio::test]
async fn test_reopen_keeps_existing_rows() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("garagelib.db");

    {
        let pool = init_database(&db_path).await.unwrap();
        sqlx::query("INSERT INTO users (telegram_id, name) VALUES (42, 'Max')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }

    let pool = init_database(&db_path).await.unwrap();
    let name: String = sqlx::query_scalar("SELECT name FROM users WHERE telegram_id = 42")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(name, "Max");
}

#[tokio::test]
async fn test_legacy_database_is_upgraded_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("garagelib.db");

    // Catalog as written by the first release: no artist link, no mirror id
    {
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new().connect(&url).await.unwrap();
        sqlx::query(
            "CREATE TABLE tracks (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER, \
             title TEXT, performer TEXT, file_id TEXT, is_common INTEGER, \
             created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO tracks (user_id, title, performer, file_id, is_common) \
             VALUES (7, 'Old', 'Max', 'file-1', NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;
    }

    let pool = init_database(&db_path).await.unwrap();

    let columns: Vec<String> = introspect_table(&pool, "tracks")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(columns.iter().any(|c| c == "artist_id"));
    assert!(columns.iter().any(|c| c == "storage_message_id"));

    let flag: Option<i64> = sqlx::query_scalar("SELECT is_common FROM tracks WHERE title = 'Old'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(flag, Some(0));
}
