//! What a turn shows the user next

use super::screens::strip_markdown;
use crate::transport::{InlineKeyboard, ParseMode};

/// A message with its keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
    pub parse_mode: Option<ParseMode>,
}

impl Screen {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            parse_mode: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn markdown(mut self) -> Self {
        self.parse_mode = Some(ParseMode::Markdown);
        self
    }

    /// Text to send when the transport refuses the formatted version
    pub fn plain_text(&self) -> String {
        match self.parse_mode {
            Some(ParseMode::Markdown) => strip_markdown(&self.text),
            None => self.text.clone(),
        }
    }

    /// Same screen with a line of text in front
    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.text = format!("{}\n\n{}", prefix, self.text);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Next step of a flow or a navigation screen
    Prompt(Screen),
    /// Terminal success, usually back at the main menu
    Finished(Screen),
    /// Operation failed; the screen says what the user can do
    Failed(Screen),
    /// Input refused: alert, then optionally show the step again
    Rejected {
        alert: String,
        retry: Option<Screen>,
    },
    /// Re-send a stored audio artifact to the user
    Audio {
        artifact_ref: String,
        caption: String,
    },
}

impl Outcome {
    pub fn rejected(alert: impl Into<String>, retry: Option<Screen>) -> Self {
        Outcome::Rejected {
            alert: alert.into(),
            retry,
        }
    }

    /// Screen that will be rendered, if any
    pub fn screen(&self) -> Option<&Screen> {
        match self {
            Outcome::Prompt(screen) | Outcome::Finished(screen) | Outcome::Failed(screen) => {
                Some(screen)
            }
            Outcome::Rejected { retry, .. } => retry.as_ref(),
            Outcome::Audio { .. } => None,
        }
    }
}
