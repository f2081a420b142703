//! Callback tokens
//!
//! Keyboard buttons carry short string tokens (`save_common`,
//! `choose_artist_12`, ...). They are parsed into [`Command`] once at the
//! dispatch edge; a token that does not parse is a validation error.

use garagelib_common::db::{ArtistId, TrackId};

use crate::error::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // Upload workflow
    AddTrack,
    SavePersonal,
    SaveCommon,
    CancelUpload,
    EditMetadata,
    MetaArtist(ArtistId),
    ConfirmMetadata,
    CancelMetadata,
    ChooseArtist(ArtistId),
    CreateArtistCard,
    CancelArtistCard,

    // Catalog browsing
    MyCatalog,
    CommonPlaylist,
    MyArtists,
    ViewArtist(ArtistId),
    DeleteArtist(ArtistId),
    PlayTrack(TrackId),
    ListenTrack(TrackId),
    DeleteTrack(TrackId),
    BackMain,
    About,
}

/// Tokens carrying an id, longest prefix first
const PREFIXED: &[(&str, fn(i64) -> Command)] = &[
    ("delete_artist_", Command::DeleteArtist),
    ("choose_artist_", Command::ChooseArtist),
    ("meta_artist_", Command::MetaArtist),
    ("artist_", Command::ViewArtist),
    ("play_", Command::PlayTrack),
    ("listen_", Command::ListenTrack),
    ("delete_", Command::DeleteTrack),
];

impl Command {
    pub fn parse(token: &str) -> Result<Self, WorkflowError> {
        let command = match token {
            "add_track" => Command::AddTrack,
            "save_personal" => Command::SavePersonal,
            "save_common" => Command::SaveCommon,
            "cancel_upload" => Command::CancelUpload,
            "edit_metadata" => Command::EditMetadata,
            "confirm_metadata" => Command::ConfirmMetadata,
            "cancel_metadata" => Command::CancelMetadata,
            "create_artist_card" => Command::CreateArtistCard,
            "cancel_artist_card" => Command::CancelArtistCard,
            "my_catalog" => Command::MyCatalog,
            "common_playlist" => Command::CommonPlaylist,
            "my_artist" => Command::MyArtists,
            "back_main" => Command::BackMain,
            "about_bot" => Command::About,
            _ => return Self::parse_prefixed(token),
        };
        Ok(command)
    }

    fn parse_prefixed(token: &str) -> Result<Self, WorkflowError> {
        for &(prefix, build) in PREFIXED {
            if let Some(rest) = token.strip_prefix(prefix) {
                return rest
                    .parse::<i64>()
                    .map(build)
                    .map_err(|_| invalid_token(token));
            }
        }
        Err(invalid_token(token))
    }

    /// Token placed in `callback_data`
    pub fn token(&self) -> String {
        match self {
            Command::AddTrack => "add_track".to_string(),
            Command::SavePersonal => "save_personal".to_string(),
            Command::SaveCommon => "save_common".to_string(),
            Command::CancelUpload => "cancel_upload".to_string(),
            Command::EditMetadata => "edit_metadata".to_string(),
            Command::MetaArtist(id) => format!("meta_artist_{}", id),
            Command::ConfirmMetadata => "confirm_metadata".to_string(),
            Command::CancelMetadata => "cancel_metadata".to_string(),
            Command::ChooseArtist(id) => format!("choose_artist_{}", id),
            Command::CreateArtistCard => "create_artist_card".to_string(),
            Command::CancelArtistCard => "cancel_artist_card".to_string(),
            Command::MyCatalog => "my_catalog".to_string(),
            Command::CommonPlaylist => "common_playlist".to_string(),
            Command::MyArtists => "my_artist".to_string(),
            Command::ViewArtist(id) => format!("artist_{}", id),
            Command::DeleteArtist(id) => format!("delete_artist_{}", id),
            Command::PlayTrack(id) => format!("play_{}", id),
            Command::ListenTrack(id) => format!("listen_{}", id),
            Command::DeleteTrack(id) => format!("delete_{}", id),
            Command::BackMain => "back_main".to_string(),
            Command::About => "about_bot".to_string(),
        }
    }
}

fn invalid_token(token: &str) -> WorkflowError {
    tracing::debug!(token, "Unparseable callback token");
    WorkflowError::Validation("Invalid selection.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_tokens_do_not_shadow_each_other() {
        assert_eq!(Command::parse("artist_3").unwrap(), Command::ViewArtist(3));
        assert_eq!(
            Command::parse("choose_artist_3").unwrap(),
            Command::ChooseArtist(3)
        );
        assert_eq!(Command::parse("meta_artist_3").unwrap(), Command::MetaArtist(3));
        assert_eq!(
            Command::parse("delete_artist_3").unwrap(),
            Command::DeleteArtist(3)
        );
        assert_eq!(Command::parse("delete_3").unwrap(), Command::DeleteTrack(3));
    }

    #[test]
    fn test_token_parses_back() {
        for command in [
            Command::SaveCommon,
            Command::CancelArtistCard,
            Command::MyArtists,
            Command::About,
            Command::ListenTrack(41),
            Command::ChooseArtist(-5),
        ] {
            assert_eq!(Command::parse(&command.token()).unwrap(), command);
        }
    }

    #[test]
    fn test_malformed_tokens_are_validation_errors() {
        for token in ["", "play_", "play_x", "choose_artist_1.5", "launch_rockets"] {
            assert!(matches!(
                Command::parse(token),
                Err(WorkflowError::Validation(_))
            ));
        }
    }
}
