//! Catalog record models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Transport-issued user identity (also the private chat id)
pub type UserId = i64;

/// Row id of an artist identity
pub type ArtistId = i64;

/// Row id of a track
pub type TrackId = i64;

/// Title used when an artifact carries no title tag
pub const DEFAULT_TITLE: &str = "Untitled";

/// Maximum stored length of an artist identity name, in characters
pub const ARTIST_NAME_MAX_CHARS: usize = 128;

/// Registered bot user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

/// Artist identity card owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistIdentity {
    pub id: ArtistId,
    pub user_id: UserId,
    pub name: String,
}

/// Where a track is listed. Fixed when the track is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Owner's private catalog only
    Personal,
    /// Shared playlist visible to every user
    Common,
}

impl Visibility {
    /// Value stored in the `is_common` column
    pub fn as_flag(self) -> i64 {
        match self {
            Visibility::Personal => 0,
            Visibility::Common => 1,
        }
    }

    /// Decode the `is_common` column; NULL and 0 both mean personal
    pub fn from_flag(flag: Option<i64>) -> Self {
        match flag {
            Some(v) if v != 0 => Visibility::Common,
            _ => Visibility::Personal,
        }
    }

    pub fn is_common(self) -> bool {
        self == Visibility::Common
    }
}

/// Saved track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub user_id: UserId,
    /// Artist identity the track is attributed to, if any
    pub artist_id: Option<ArtistId>,
    pub title: String,
    /// Display string shown as the performer
    pub performer: String,
    /// Opaque transport handle used to re-send the audio
    pub artifact_ref: String,
    /// Message id of the mirrored copy in the storage chat
    pub mirror_message_id: Option<i64>,
    pub visibility: Visibility,
    pub created_at: Option<NaiveDateTime>,
}

impl Track {
    /// `performer — title` line used for captions and listings
    pub fn display_line(&self) -> String {
        format!("{} — {}", self.performer, self.title)
    }
}

/// Fields needed to insert a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrack {
    pub user_id: UserId,
    pub artist_id: Option<ArtistId>,
    pub title: String,
    pub performer: String,
    pub artifact_ref: String,
    pub mirror_message_id: Option<i64>,
}

/// Truncate an artist name to the stored maximum, on a character boundary
pub fn truncate_artist_name(name: &str) -> String {
    name.chars().take(ARTIST_NAME_MAX_CHARS).collect()
}
