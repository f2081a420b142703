//! Prompts of the upload workflow

use garagelib_common::db::ArtistIdentity;

use super::outcome::Screen;
use crate::menus;

pub const NO_UPLOAD_TEXT: &str = "⚠️ No track in progress. Tap “Add track” to start.";
pub const OUT_OF_STEP_TEXT: &str = "This action is not available right now.";

/// Escape legacy-Markdown control characters in user-supplied text
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Plain-text reading of a legacy-Markdown string: escapes are resolved and
/// formatting markers dropped
pub fn strip_markdown(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => plain.push(next),
                None => plain.push(c),
            },
            '*' | '_' | '`' => {}
            _ => plain.push(c),
        }
    }
    plain
}

pub fn upload_prompt() -> Screen {
    Screen::new("🎵 Send me an audio file (mp3/ogg) to add it.")
        .with_keyboard(menus::cancel_upload_menu())
}

pub fn save_destination_screen(title: &str, performer: &str) -> Screen {
    Screen::new(format!(
        "📀 Track: *{}*\nPerformer: *{}*\n\nWhere should it be saved?",
        escape_markdown(title),
        escape_markdown(performer)
    ))
    .with_keyboard(menus::save_destination_menu())
    .markdown()
}

pub fn title_prompt() -> Screen {
    Screen::new("🎵 Enter a new track title:").with_keyboard(menus::cancel_metadata_menu())
}

pub fn performer_choice_screen(artists: &[ArtistIdentity]) -> Screen {
    let text = if artists.is_empty() {
        "You have no artist cards yet. Create one to set the performer."
    } else {
        "🎤 Choose the performer (one of your artist cards):"
    };
    Screen::new(text).with_keyboard(menus::performer_choice_menu(artists))
}

pub fn edit_confirm_screen(title: &str, performer: &str) -> Screen {
    Screen::new(format!(
        "📀 *Review:*\n🎵 Title: {}\n👤 Performer: {}",
        escape_markdown(title),
        escape_markdown(performer)
    ))
    .with_keyboard(menus::confirm_metadata_menu())
    .markdown()
}

pub fn disambiguation_screen(candidates: &[ArtistIdentity]) -> Screen {
    Screen::new("You have several artist cards. Choose which one to publish this track under:")
        .with_keyboard(menus::disambiguation_menu(candidates))
}

pub fn artist_name_prompt() -> Screen {
    Screen::new("Enter the name of the new artist:").with_keyboard(menus::cancel_artist_card_menu())
}

pub fn main_menu_screen(text: impl Into<String>) -> Screen {
    Screen::new(text).with_keyboard(menus::main_menu())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("lo_fi *mix*"), "lo\\_fi \\*mix\\*");
        assert_eq!(escape_markdown("Demo"), "Demo");
    }

    #[test]
    fn test_strip_markdown_undoes_escapes() {
        let marked = format!("📀 Track: *{}*", escape_markdown("lo_fi *mix*"));
        assert_eq!(strip_markdown(&marked), "📀 Track: lo_fi *mix*");
        assert_eq!(strip_markdown("plain [text]"), "plain [text]");
    }

    #[test]
    fn test_save_destination_screen_offers_edit() {
        let screen = save_destination_screen("Demo", "Max");
        let tokens = screen.keyboard.as_ref().unwrap().tokens();
        assert_eq!(
            tokens,
            vec!["save_personal", "save_common", "edit_metadata", "cancel_upload"]
        );
    }
}
