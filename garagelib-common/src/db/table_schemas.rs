//! Declared column sets for catalog tables
//!
//! Databases created by early bot versions have `tracks` without
//! `artist_id` or `storage_message_id`, and `users` without `name`. The
//! declarations below let [`SchemaSync`] add those columns in place.

use crate::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

pub struct UsersTableSchema;

impl TableSchema for UsersTableSchema {
    fn table_name() -> &'static str {
        "users"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("telegram_id", "INTEGER"),
            ColumnDefinition::new("name", "TEXT"),
        ]
    }
}

pub struct ArtistsTableSchema;

impl TableSchema for ArtistsTableSchema {
    fn table_name() -> &'static str {
        "artists"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("user_id", "INTEGER"),
            ColumnDefinition::new("name", "TEXT"),
        ]
    }
}

pub struct TracksTableSchema;

impl TableSchema for TracksTableSchema {
    fn table_name() -> &'static str {
        "tracks"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("user_id", "INTEGER"),
            // Added when artist cards were introduced
            ColumnDefinition::new("artist_id", "INTEGER"),
            ColumnDefinition::new("title", "TEXT"),
            ColumnDefinition::new("performer", "TEXT"),
            ColumnDefinition::new("file_id", "TEXT"),
            // Added with storage chat mirroring
            ColumnDefinition::new("storage_message_id", "INTEGER"),
            ColumnDefinition::new("is_common", "INTEGER").default("0"),
            ColumnDefinition::new("created_at", "TIMESTAMP"),
        ]
    }
}

pub struct NotificationsTableSchema;

impl TableSchema for NotificationsTableSchema {
    fn table_name() -> &'static str {
        "notifications"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").primary_key(),
            ColumnDefinition::new("user_id", "INTEGER"),
            ColumnDefinition::new("message", "TEXT"),
            ColumnDefinition::new("created_at", "TIMESTAMP"),
        ]
    }
}

/// Sync every catalog table against its declaration
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    info!("Synchronizing catalog table schemas");

    SchemaSync::sync_table::<UsersTableSchema>(pool).await?;
    SchemaSync::sync_table::<ArtistsTableSchema>(pool).await?;
    SchemaSync::sync_table::<TracksTableSchema>(pool).await?;
    SchemaSync::sync_table::<NotificationsTableSchema>(pool).await?;

    Ok(())
}
