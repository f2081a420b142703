//! Publish pipeline: mirror, persist, notify
//!
//! Best-effort and not transactional. The track record is written whether
//! or not the storage mirror or the notifications succeed. A crash between
//! mirroring and the insert leaves an orphaned mirror, never a dangling
//! catalog row.

use garagelib_common::db::{ArtistId, NewTrack, TrackId, UserId, Visibility};
use garagelib_common::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::notification_fanout::{broadcast, FanoutReport};
use crate::db;
use crate::transport::{ChatId, MessageId, Transport};

/// Finalized track payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub user_id: UserId,
    pub artifact_ref: String,
    pub title: String,
    /// Display performer; the artist card name for common tracks
    pub performer: String,
    pub artist_id: Option<ArtistId>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub track_id: TrackId,
    /// Reference stored with the track (mirrored or original)
    pub artifact_ref: String,
    pub mirror_message_id: Option<MessageId>,
    /// Present for common tracks
    pub notifications: Option<FanoutReport>,
}

/// Body of the "new common track" notification
pub fn new_track_note(artist_name: &str, title: &str) -> String {
    format!("🎵 {} released a new track: «{}»", artist_name, title)
}

pub struct PublishPipeline {
    db: SqlitePool,
    transport: Arc<dyn Transport>,
    storage_chat_id: Option<ChatId>,
    notify_delay: Duration,
}

impl PublishPipeline {
    pub fn new(
        db: SqlitePool,
        transport: Arc<dyn Transport>,
        storage_chat_id: Option<ChatId>,
        notify_delay: Duration,
    ) -> Self {
        Self {
            db,
            transport,
            storage_chat_id,
            notify_delay,
        }
    }

    /// Only catalog write failures are returned as errors
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishReport> {
        let (artifact_ref, mirror_message_id) = self.mirror(request).await;

        let new_track = NewTrack {
            user_id: request.user_id,
            artist_id: request.artist_id,
            title: request.title.clone(),
            performer: request.performer.clone(),
            artifact_ref: artifact_ref.clone(),
            mirror_message_id,
        };
        let track_id = match request.visibility {
            Visibility::Personal => db::add_personal_track(&self.db, &new_track).await?,
            Visibility::Common => db::add_common_track(&self.db, &new_track).await?,
        };

        info!(
            user_id = request.user_id,
            track_id,
            visibility = ?request.visibility,
            mirrored = mirror_message_id.is_some(),
            "Track saved"
        );

        let notifications = if request.visibility.is_common() {
            Some(self.notify_common(request).await)
        } else {
            None
        };

        Ok(PublishReport {
            track_id,
            artifact_ref,
            mirror_message_id,
            notifications,
        })
    }

    /// Copy the artifact to the storage chat; falls back to the original reference
    async fn mirror(&self, request: &PublishRequest) -> (String, Option<MessageId>) {
        let Some(storage_chat_id) = self.storage_chat_id else {
            warn!(user_id = request.user_id, "No storage chat configured, track not mirrored");
            return (request.artifact_ref.clone(), None);
        };

        let caption = format!("{} — {}", request.performer, request.title);
        match self
            .transport
            .send_audio(storage_chat_id, &request.artifact_ref, &caption)
            .await
        {
            Ok(sent) => (
                sent.artifact_ref
                    .unwrap_or_else(|| request.artifact_ref.clone()),
                Some(sent.message_id),
            ),
            Err(e) => {
                warn!(
                    user_id = request.user_id,
                    error = %e,
                    "Mirror to storage chat failed, keeping original reference"
                );
                (request.artifact_ref.clone(), None)
            }
        }
    }

    async fn notify_common(&self, request: &PublishRequest) -> FanoutReport {
        let note = new_track_note(&request.performer, &request.title);

        let recipients: Vec<UserId> = match db::list_all_user_ids(&self.db).await {
            Ok(ids) => ids.into_iter().filter(|&id| id != request.user_id).collect(),
            Err(e) => {
                warn!(user_id = request.user_id, error = %e, "Cannot list users, skipping notifications");
                return FanoutReport::default();
            }
        };

        let report = broadcast(
            self.transport.as_ref(),
            &recipients,
            &note,
            None,
            self.notify_delay,
        )
        .await;

        if let Err(e) = db::add_notification(&self.db, request.user_id, &note).await {
            warn!(user_id = request.user_id, error = %e, "Failed to log notification");
        }

        report
    }
}
