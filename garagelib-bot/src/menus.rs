//! Keyboards shared by the upload workflow and catalog browsing

use garagelib_common::db::{ArtistIdentity, Track};

use crate::dispatch::Command;
use crate::transport::InlineKeyboard;

pub fn main_menu() -> InlineKeyboard {
    InlineKeyboard::new()
        .button("🎧 My catalog", Command::MyCatalog)
        .button("🌍 Common playlist", Command::CommonPlaylist)
        .button("🎤 My artist cards", Command::MyArtists)
        .button("➕ Add track", Command::AddTrack)
        .button("ℹ️ About", Command::About)
}

pub fn cancel_upload_menu() -> InlineKeyboard {
    InlineKeyboard::new().button("❌ Cancel", Command::CancelUpload)
}

/// Destination choice after an artifact arrives
pub fn save_destination_menu() -> InlineKeyboard {
    InlineKeyboard::new()
        .button("💾 Personal catalog", Command::SavePersonal)
        .button("🌍 Common playlist", Command::SaveCommon)
        .button("✏️ Edit metadata", Command::EditMetadata)
        .button("❌ Cancel", Command::CancelUpload)
}

/// Leaves artist card creation only, not the upload it interrupted
pub fn cancel_artist_card_menu() -> InlineKeyboard {
    InlineKeyboard::new().button("❌ Cancel", Command::CancelArtistCard)
}

pub fn cancel_metadata_menu() -> InlineKeyboard {
    InlineKeyboard::new().button("❌ Cancel", Command::CancelMetadata)
}

/// Performer choice in the edit sub-flow
pub fn performer_choice_menu(artists: &[ArtistIdentity]) -> InlineKeyboard {
    artists
        .iter()
        .fold(InlineKeyboard::new(), |kb, a| {
            kb.button(a.name.clone(), Command::MetaArtist(a.id))
        })
        .button(
            if artists.is_empty() {
                "➕ Create card"
            } else {
                "➕ Create new"
            },
            Command::CreateArtistCard,
        )
        .button("❌ Cancel", Command::CancelMetadata)
}

pub fn confirm_metadata_menu() -> InlineKeyboard {
    InlineKeyboard::new()
        .button("✅ Save", Command::ConfirmMetadata)
        .button("❌ Cancel", Command::CancelMetadata)
}

/// Artist card choice for a common publish
pub fn disambiguation_menu(candidates: &[ArtistIdentity]) -> InlineKeyboard {
    candidates
        .iter()
        .fold(InlineKeyboard::new(), |kb, a| {
            kb.button(a.name.clone(), Command::ChooseArtist(a.id))
        })
        .button("➕ Create new", Command::CreateArtistCard)
        .button("❌ Cancel", Command::CancelUpload)
}

/// Track list leading to track cards
pub fn track_list_menu(tracks: &[Track], back: Command) -> InlineKeyboard {
    tracks
        .iter()
        .fold(InlineKeyboard::new(), |kb, t| {
            kb.button(t.display_line(), Command::PlayTrack(t.id))
        })
        .button("⬅️ Back", back)
}

pub fn back_to_main_menu() -> InlineKeyboard {
    InlineKeyboard::new().button("⬅️ Back", Command::BackMain)
}
