//! Inline keyboards
//!
//! Serializes directly as the Bot API `reply_markup` object. Buttons are
//! built from [`Command`] so every callback token the bot emits is one the
//! dispatcher can parse back.

use serde::{Deserialize, Serialize};

use crate::dispatch::Command;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row holding a single button
    pub fn button(mut self, text: impl Into<String>, command: Command) -> Self {
        self.inline_keyboard.push(vec![InlineButton {
            text: text.into(),
            callback_data: command.token(),
        }]);
        self
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.inline_keyboard.iter().flatten()
    }

    /// Callback tokens in display order
    pub fn tokens(&self) -> Vec<&str> {
        self.buttons().map(|b| b.callback_data.as_str()).collect()
    }

    /// Button labels in display order
    pub fn labels(&self) -> Vec<&str> {
        self.buttons().map(|b| b.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_reply_markup() {
        let keyboard = InlineKeyboard::new()
            .button("🎧 My catalog", Command::MyCatalog)
            .button("Max", Command::ChooseArtist(7));

        let json = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(
            json["inline_keyboard"][1][0]["callback_data"],
            serde_json::json!("choose_artist_7")
        );
        assert_eq!(keyboard.labels(), vec!["🎧 My catalog", "Max"]);
    }
}
