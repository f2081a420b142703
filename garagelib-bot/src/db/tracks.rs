//! Track records
//!
//! Visibility is chosen at insert time by calling either
//! [`add_personal_track`] or [`add_common_track`] and is never updated.

use garagelib_common::db::{
    ArtistId, NewTrack, Track, TrackId, UserId, Visibility, DEFAULT_TITLE,
};
use garagelib_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const UNKNOWN_PERFORMER: &str = "Unknown";

const TRACK_COLUMNS: &str = "id, user_id, artist_id, title, performer, file_id, \
                             storage_message_id, is_common, created_at";

fn track_from_row(row: &SqliteRow) -> Track {
    Track {
        id: row.get("id"),
        user_id: row.get::<Option<i64>, _>("user_id").unwrap_or_default(),
        artist_id: row.get("artist_id"),
        title: row
            .get::<Option<String>, _>("title")
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        performer: row
            .get::<Option<String>, _>("performer")
            .unwrap_or_else(|| UNKNOWN_PERFORMER.to_string()),
        artifact_ref: row.get::<Option<String>, _>("file_id").unwrap_or_default(),
        mirror_message_id: row.get("storage_message_id"),
        visibility: Visibility::from_flag(row.get("is_common")),
        created_at: row.try_get("created_at").ok().flatten(),
    }
}

async fn insert_track(pool: &SqlitePool, track: &NewTrack, visibility: Visibility) -> Result<TrackId> {
    let result = sqlx::query(
        r#"
        INSERT INTO tracks (user_id, artist_id, title, performer, file_id, storage_message_id, is_common)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(track.user_id)
    .bind(track.artist_id)
    .bind(&track.title)
    .bind(&track.performer)
    .bind(&track.artifact_ref)
    .bind(track.mirror_message_id)
    .bind(visibility.as_flag())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn add_personal_track(pool: &SqlitePool, track: &NewTrack) -> Result<TrackId> {
    insert_track(pool, track, Visibility::Personal).await
}

pub async fn add_common_track(pool: &SqlitePool, track: &NewTrack) -> Result<TrackId> {
    insert_track(pool, track, Visibility::Common).await
}

pub async fn get_track(pool: &SqlitePool, track_id: TrackId) -> Result<Option<Track>> {
    let query = format!("SELECT {} FROM tracks WHERE id = ?", TRACK_COLUMNS);
    let row = sqlx::query(&query)
        .bind(track_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(track_from_row))
}

/// A user's tracks of either visibility, newest first
pub async fn list_user_tracks(pool: &SqlitePool, user_id: UserId) -> Result<Vec<Track>> {
    let query = format!(
        "SELECT {} FROM tracks WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        TRACK_COLUMNS
    );
    let rows = sqlx::query(&query).bind(user_id).fetch_all(pool).await?;

    Ok(rows.iter().map(track_from_row).collect())
}

/// The shared playlist, newest first
pub async fn list_common_tracks(pool: &SqlitePool) -> Result<Vec<Track>> {
    let query = format!(
        "SELECT {} FROM tracks WHERE is_common = 1 ORDER BY created_at DESC, id DESC",
        TRACK_COLUMNS
    );
    let rows = sqlx::query(&query).fetch_all(pool).await?;

    Ok(rows.iter().map(track_from_row).collect())
}

/// Common tracks attributed to one artist card, newest first
pub async fn list_common_tracks_for_artist(pool: &SqlitePool, artist_id: ArtistId) -> Result<Vec<Track>> {
    let query = format!(
        "SELECT {} FROM tracks WHERE artist_id = ? AND is_common = 1 \
         ORDER BY created_at DESC, id DESC",
        TRACK_COLUMNS
    );
    let rows = sqlx::query(&query).bind(artist_id).fetch_all(pool).await?;

    Ok(rows.iter().map(track_from_row).collect())
}

/// Delete a track record; ownership is checked by the caller
pub async fn delete_track(pool: &SqlitePool, track_id: TrackId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(track_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
