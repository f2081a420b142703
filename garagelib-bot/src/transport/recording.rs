//! In-memory transport that records every outbound call
//!
//! Used by scenario tests and local dry runs. Individual chats, audio sends
//! or edits can be configured to fail so fallback paths are reachable.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Mutex;

use super::{ChatId, InlineKeyboard, MessageId, MessageRef, ParseMode, SentAudio, Transport};
use crate::error::TransportError;

/// A successful outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Text {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboard>,
        parse_mode: Option<ParseMode>,
    },
    Edit {
        message: MessageRef,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    Audio {
        chat_id: ChatId,
        artifact_ref: String,
        caption: String,
    },
    Delete {
        chat_id: ChatId,
        message_id: MessageId,
    },
    CallbackAnswer {
        callback_id: String,
        text: Option<String>,
        show_alert: bool,
    },
}

#[derive(Default)]
pub struct RecordingTransport {
    recorded: Mutex<Vec<Recorded>>,
    /// Every `send_text` target, including failed ones
    attempts: Mutex<Vec<ChatId>>,
    failing_chats: HashSet<ChatId>,
    fail_audio: bool,
    fail_edits: bool,
    reject_markdown: bool,
    next_message_id: AtomicI64,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text and audio sends to these chats fail with `Forbidden`
    pub fn with_failing_chats(mut self, chats: impl IntoIterator<Item = ChatId>) -> Self {
        self.failing_chats.extend(chats);
        self
    }

    /// Every audio send fails with a network error
    pub fn with_failing_audio(mut self) -> Self {
        self.fail_audio = true;
        self
    }

    /// Every edit fails, forcing the send fallback
    pub fn with_failing_edits(mut self) -> Self {
        self.fail_edits = true;
        self
    }

    /// Formatted sends and edits fail with an entity parse error
    pub fn with_markdown_rejected(mut self) -> Self {
        self.reject_markdown = true;
        self
    }

    fn next_id(&self) -> MessageId {
        self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().await.clone()
    }

    pub async fn attempted_chats(&self) -> Vec<ChatId> {
        self.attempts.lock().await.clone()
    }

    /// Texts delivered to a chat, sent or edited, in order
    pub async fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.recorded
            .lock()
            .await
            .iter()
            .filter_map(|r| match r {
                Recorded::Text { chat_id, text, .. } if *chat_id == chat => Some(text.clone()),
                Recorded::Edit { message, text, .. } if message.chat_id == chat => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Most recent text or edit for a chat, with its keyboard
    pub async fn last_screen(&self, chat: ChatId) -> Option<(String, Option<InlineKeyboard>)> {
        self.recorded
            .lock()
            .await
            .iter()
            .rev()
            .find_map(|r| match r {
                Recorded::Text {
                    chat_id,
                    text,
                    keyboard,
                    ..
                } if *chat_id == chat => Some((text.clone(), keyboard.clone())),
                Recorded::Edit {
                    message,
                    text,
                    keyboard,
                } if message.chat_id == chat => Some((text.clone(), keyboard.clone())),
                _ => None,
            })
    }

    pub async fn audio_sends(&self) -> Vec<(ChatId, String, String)> {
        self.recorded
            .lock()
            .await
            .iter()
            .filter_map(|r| match r {
                Recorded::Audio {
                    chat_id,
                    artifact_ref,
                    caption,
                } => Some((*chat_id, artifact_ref.clone(), caption.clone())),
                _ => None,
            })
            .collect()
    }

    pub async fn deleted_messages(&self) -> Vec<(ChatId, MessageId)> {
        self.recorded
            .lock()
            .await
            .iter()
            .filter_map(|r| match r {
                Recorded::Delete {
                    chat_id,
                    message_id,
                } => Some((*chat_id, *message_id)),
                _ => None,
            })
            .collect()
    }

    /// Alert texts shown through callback answers
    pub async fn alerts(&self) -> Vec<String> {
        self.recorded
            .lock()
            .await
            .iter()
            .filter_map(|r| match r {
                Recorded::CallbackAnswer {
                    text: Some(text),
                    show_alert: true,
                    ..
                } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
        parse_mode: Option<ParseMode>,
    ) -> Result<MessageRef, TransportError> {
        self.attempts.lock().await.push(chat_id);

        if self.failing_chats.contains(&chat_id) {
            return Err(TransportError::Forbidden(
                "bot was blocked by the user".to_string(),
            ));
        }
        if self.reject_markdown && parse_mode.is_some() {
            return Err(TransportError::BadRequest(
                "can't parse entities".to_string(),
            ));
        }

        let message_id = self.next_id();
        self.recorded.lock().await.push(Recorded::Text {
            chat_id,
            message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
            parse_mode,
        });
        Ok(MessageRef {
            chat_id,
            message_id,
        })
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), TransportError> {
        if self.fail_edits {
            return Err(TransportError::BadRequest(
                "message can't be edited".to_string(),
            ));
        }
        if self.reject_markdown && parse_mode.is_some() {
            return Err(TransportError::BadRequest(
                "can't parse entities".to_string(),
            ));
        }

        self.recorded.lock().await.push(Recorded::Edit {
            message,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        artifact_ref: &str,
        caption: &str,
    ) -> Result<SentAudio, TransportError> {
        if self.fail_audio {
            return Err(TransportError::Network("connection reset".to_string()));
        }
        if self.failing_chats.contains(&chat_id) {
            return Err(TransportError::BadRequest("chat not found".to_string()));
        }

        let message_id = self.next_id();
        self.recorded.lock().await.push(Recorded::Audio {
            chat_id,
            artifact_ref: artifact_ref.to_string(),
            caption: caption.to_string(),
        });
        Ok(SentAudio {
            message_id,
            artifact_ref: Some(format!("mirrored-{}", message_id)),
        })
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError> {
        if self.failing_chats.contains(&chat_id) {
            return Err(TransportError::BadRequest(
                "message to delete not found".to_string(),
            ));
        }

        self.recorded.lock().await.push(Recorded::Delete {
            chat_id,
            message_id,
        });
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TransportError> {
        self.recorded.lock().await.push(Recorded::CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
            show_alert,
        });
        Ok(())
    }
}
