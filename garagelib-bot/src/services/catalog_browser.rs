//! Catalog browsing: menus, listings, track and artist cards
//!
//! Read-mostly counterpart of the upload workflow. The only writes are
//! user registration on `/start`, owner-scoped track deletion and artist
//! card deletion.

use garagelib_common::db::{ArtistId, TrackId, UserId};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db;
use crate::dispatch::Command;
use crate::error::{WorkflowError, WorkflowResult};
use crate::menus;
use crate::transport::{ChatId, InlineKeyboard, Sender, Transport};
use crate::workflow::{escape_markdown, Outcome, Screen};

use super::artist_resolver::ARTIST_NOT_FOUND_TEXT;

pub const TRACK_NOT_FOUND_TEXT: &str = "❌ Track not found.";

pub struct CatalogBrowser {
    db: SqlitePool,
    transport: Arc<dyn Transport>,
    storage_chat_id: Option<ChatId>,
    bot_version: String,
}

fn main_menu_screen(text: impl Into<String>) -> Screen {
    Screen::new(text).with_keyboard(menus::main_menu())
}

impl CatalogBrowser {
    pub fn new(
        db: SqlitePool,
        transport: Arc<dyn Transport>,
        storage_chat_id: Option<ChatId>,
        bot_version: impl Into<String>,
    ) -> Self {
        Self {
            db,
            transport,
            storage_chat_id,
            bot_version: bot_version.into(),
        }
    }

    /// `/start`: register and greet
    pub async fn start(&self, user: &Sender) -> WorkflowResult<Outcome> {
        db::add_user(&self.db, user.id, &user.full_name).await?;
        info!(user_id = user.id, "User started the bot");

        let text = format!(
            "👋 Hi, {}!\nWelcome to GarageLib.\n\n📦 Bot version: *{}*",
            escape_markdown(&user.first_name),
            escape_markdown(&self.bot_version)
        );
        Ok(Outcome::Prompt(main_menu_screen(text).markdown()))
    }

    pub fn main_menu(&self) -> Outcome {
        Outcome::Prompt(main_menu_screen("🏠 Main menu:"))
    }

    pub fn about(&self) -> Outcome {
        let text = format!(
            "🤖 *GarageLib*\nA shared library for garage bands.\n\n\
             Save tracks to your personal catalog or publish them to the common \
             playlist under one of your artist cards.\n\n📦 Version: *{}*",
            escape_markdown(&self.bot_version)
        );
        Outcome::Prompt(
            Screen::new(text)
                .with_keyboard(menus::back_to_main_menu())
                .markdown(),
        )
    }

    pub async fn my_catalog(&self, user_id: UserId) -> WorkflowResult<Outcome> {
        let tracks = db::list_user_tracks(&self.db, user_id).await?;
        if tracks.is_empty() {
            return Ok(Outcome::Prompt(
                Screen::new("📭 Your catalog is empty. Add a track from the main menu.")
                    .with_keyboard(menus::back_to_main_menu()),
            ));
        }

        Ok(Outcome::Prompt(
            Screen::new(format!("🎧 Your tracks ({}):", tracks.len()))
                .with_keyboard(menus::track_list_menu(&tracks, Command::BackMain)),
        ))
    }

    /// Every artist card, by name
    pub async fn common_playlist(&self) -> WorkflowResult<Outcome> {
        let artists = db::list_all_artists(&self.db).await?;
        if artists.is_empty() {
            return Ok(Outcome::Prompt(
                Screen::new("📭 The common playlist is empty so far.")
                    .with_keyboard(menus::back_to_main_menu()),
            ));
        }

        let keyboard = artists
            .iter()
            .fold(InlineKeyboard::new(), |kb, a| {
                kb.button(format!("🎤 {}", a.name), Command::ViewArtist(a.id))
            })
            .button("⬅️ Back", Command::BackMain);

        Ok(Outcome::Prompt(
            Screen::new("🌍 Common playlist. Choose an artist:").with_keyboard(keyboard),
        ))
    }

    /// Artist card with that artist's common tracks, newest first
    pub async fn view_artist(&self, viewer: UserId, artist_id: ArtistId) -> WorkflowResult<Outcome> {
        let artist = db::get_artist(&self.db, artist_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(ARTIST_NOT_FOUND_TEXT.to_string()))?;
        let tracks = db::list_common_tracks_for_artist(&self.db, artist_id).await?;

        let mut text = format!("🎤 *{}*\n", escape_markdown(&artist.name));
        if tracks.is_empty() {
            text.push_str("\nNo tracks in the common playlist yet.");
        } else {
            text.push_str(&format!("\nTracks: {}", tracks.len()));
        }

        let mut keyboard = tracks.iter().fold(InlineKeyboard::new(), |kb, t| {
            kb.button(format!("🎵 {}", t.display_line()), Command::PlayTrack(t.id))
        });
        if artist.user_id == viewer {
            keyboard = keyboard.button("🗑 Delete artist card", Command::DeleteArtist(artist.id));
        }
        keyboard = keyboard.button("⬅️ Back", Command::CommonPlaylist);

        Ok(Outcome::Prompt(
            Screen::new(text).with_keyboard(keyboard).markdown(),
        ))
    }

    pub async fn my_artists(&self, user_id: UserId) -> WorkflowResult<Outcome> {
        let artists = db::list_artists_for_user(&self.db, user_id).await?;

        let text = if artists.is_empty() {
            "🎤 You have no artist cards yet.".to_string()
        } else {
            format!("🎤 Your artist cards ({}):", artists.len())
        };
        let keyboard = artists
            .iter()
            .fold(InlineKeyboard::new(), |kb, a| {
                kb.button(a.name.clone(), Command::ViewArtist(a.id))
            })
            .button("➕ Create new", Command::CreateArtistCard)
            .button("⬅️ Back", Command::BackMain);

        Ok(Outcome::Prompt(Screen::new(text).with_keyboard(keyboard)))
    }

    /// Track card; delete is offered to the owner only
    pub async fn view_track(&self, viewer: UserId, track_id: TrackId) -> WorkflowResult<Outcome> {
        let track = db::get_track(&self.db, track_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(TRACK_NOT_FOUND_TEXT.to_string()))?;

        let back = match (track.visibility.is_common(), track.artist_id) {
            (true, Some(artist_id)) => Command::ViewArtist(artist_id),
            (true, None) => Command::CommonPlaylist,
            (false, _) => Command::MyCatalog,
        };

        let mut keyboard = InlineKeyboard::new().button("▶️ Listen", Command::ListenTrack(track.id));
        if track.user_id == viewer {
            keyboard = keyboard.button("🗑 Delete", Command::DeleteTrack(track.id));
        }
        keyboard = keyboard.button("⬅️ Back", back);

        let text = format!(
            "🎵 *{}*\n👤 {}",
            escape_markdown(&track.title),
            escape_markdown(&track.performer)
        );
        Ok(Outcome::Prompt(
            Screen::new(text).with_keyboard(keyboard).markdown(),
        ))
    }

    /// Re-send the stored artifact
    pub async fn listen(&self, track_id: TrackId) -> WorkflowResult<Outcome> {
        let track = db::get_track(&self.db, track_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(TRACK_NOT_FOUND_TEXT.to_string()))?;

        Ok(Outcome::Audio {
            caption: track.display_line(),
            artifact_ref: track.artifact_ref,
        })
    }

    /// Owner-only delete; the mirror message is removed best-effort first
    pub async fn delete_track(&self, user_id: UserId, track_id: TrackId) -> WorkflowResult<Outcome> {
        let track = db::get_track(&self.db, track_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(TRACK_NOT_FOUND_TEXT.to_string()))?;

        if track.user_id != user_id {
            warn!(user_id, track_id, owner = track.user_id, "Delete of foreign track refused");
            return Err(WorkflowError::PermissionDenied(
                "🚫 You cannot delete someone else's track.".to_string(),
            ));
        }

        if let (Some(storage_chat_id), Some(message_id)) = (self.storage_chat_id, track.mirror_message_id) {
            if let Err(e) = self.transport.delete_message(storage_chat_id, message_id).await {
                warn!(track_id, message_id, error = %e, "Could not remove mirror message");
            }
        }

        db::delete_track(&self.db, track_id).await?;
        info!(user_id, track_id, "Track deleted");

        Ok(Outcome::Finished(main_menu_screen("🗑 Track deleted.")))
    }

    /// Owner-scoped card deletion; tracks keep their stored performer
    pub async fn delete_artist(&self, user_id: UserId, artist_id: ArtistId) -> WorkflowResult<Outcome> {
        if !db::delete_artist(&self.db, artist_id, user_id).await? {
            return Err(WorkflowError::NotFound(ARTIST_NOT_FOUND_TEXT.to_string()));
        }
        info!(user_id, artist_id, "Artist card deleted");

        Ok(Outcome::Finished(main_menu_screen("🗑 Artist card deleted.")))
    }
}
