//! Message transport seam
//!
//! Everything the bot says goes through [`Transport`]. Production uses the
//! Telegram Bot API client; tests use [`RecordingTransport`].
//!
//! Incoming updates are reduced to [`Incoming`] before dispatch so the
//! workflow never sees transport wire types.

pub mod keyboard;
pub mod recording;
pub mod telegram;
pub mod types;

pub use keyboard::{InlineButton, InlineKeyboard};
pub use recording::{Recorded, RecordingTransport};
pub use telegram::TelegramClient;

use async_trait::async_trait;
use garagelib_common::db::UserId;

use crate::error::TransportError;

/// Chat identifier; equals the user id for private chats
pub type ChatId = i64;

/// Message identifier within a chat
pub type MessageId = i64;

/// Text formatting understood by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Markdown,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
        }
    }
}

/// Location of a message the bot sent or received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Result of sending an audio artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentAudio {
    pub message_id: MessageId,
    /// Reference issued for the re-sent copy, when the transport returns one
    pub artifact_ref: Option<String>,
}

/// Identity of the user behind an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub first_name: String,
    /// First and last name joined; falls back to the first name
    pub full_name: String,
}

/// Audio attached to an incoming message, with its embedded tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingArtifact {
    pub artifact_ref: String,
    pub title: Option<String>,
    pub performer: Option<String>,
}

/// One conversational update, already classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// `/start` command
    Start { sender: Sender, chat_id: ChatId },
    /// Free text (titles, artist names)
    Text {
        sender: Sender,
        chat_id: ChatId,
        text: String,
    },
    /// Audio upload
    Artifact {
        sender: Sender,
        chat_id: ChatId,
        artifact: IncomingArtifact,
    },
    /// Inline keyboard press
    Callback {
        sender: Sender,
        callback_id: String,
        /// Message carrying the pressed keyboard, if still accessible
        origin: Option<MessageRef>,
        data: String,
    },
}

impl Incoming {
    pub fn sender(&self) -> &Sender {
        match self {
            Incoming::Start { sender, .. }
            | Incoming::Text { sender, .. }
            | Incoming::Artifact { sender, .. }
            | Incoming::Callback { sender, .. } => sender,
        }
    }

    /// Chat that should receive the reply
    pub fn chat_id(&self) -> ChatId {
        match self {
            Incoming::Start { chat_id, .. }
            | Incoming::Text { chat_id, .. }
            | Incoming::Artifact { chat_id, .. } => *chat_id,
            Incoming::Callback { sender, origin, .. } => {
                origin.map(|o| o.chat_id).unwrap_or(sender.id)
            }
        }
    }
}

/// Outbound operations the bot needs from a chat transport
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
        parse_mode: Option<ParseMode>,
    ) -> Result<MessageRef, TransportError>;

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), TransportError>;

    async fn send_audio(
        &self,
        chat_id: ChatId,
        artifact_ref: &str,
        caption: &str,
    ) -> Result<SentAudio, TransportError>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId)
        -> Result<(), TransportError>;

    /// Acknowledge a keyboard press, optionally with a popup alert
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TransportError>;
}
