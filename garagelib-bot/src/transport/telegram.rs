//! Telegram Bot API client
//!
//! Thin JSON-over-HTTPS client for the handful of methods the bot uses.
//! Every call returns `Result<_, TransportError>`; callers decide the
//! fallback.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::types::{Message, Update};
use super::{ChatId, InlineKeyboard, MessageId, MessageRef, ParseMode, SentAudio, Transport};
use crate::error::TransportError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Head-room added to the long-poll timeout for the HTTP request itself
const HTTP_TIMEOUT_MARGIN_SECS: u64 = 10;

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, TransportError> {
        if self.ok {
            return self
                .result
                .ok_or_else(|| TransportError::Decode("response has no result".to_string()));
        }

        Err(api_error(
            self.error_code.unwrap_or(0),
            self.description.unwrap_or_default(),
            self.parameters.and_then(|p| p.retry_after),
        ))
    }
}

/// Map a failed Bot API response to a transport error
pub fn api_error(code: i64, description: String, retry_after: Option<u64>) -> TransportError {
    if let Some(seconds) = retry_after {
        return TransportError::RetryAfter(seconds);
    }
    match code {
        403 => TransportError::Forbidden(description),
        400 => TransportError::BadRequest(description),
        _ => TransportError::Api(code, description),
    }
}

pub struct TelegramClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    /// `poll_timeout_secs` sizes the HTTP timeout so long polls are not cut short
    pub fn new(
        token: impl Into<String>,
        base_url: Option<&str>,
        poll_timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                poll_timeout_secs + HTTP_TIMEOUT_MARGIN_SECS,
            ))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url
                .unwrap_or(DEFAULT_API_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            token: token.into(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value) -> Result<T, TransportError> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        debug!(method, "Bot API call");

        // The URL embeds the token; keep it out of error messages
        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.without_url().to_string()))?;

        body.into_result()
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError> {
        let mut payload = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }
        self.call("getUpdates", payload).await
    }
}

fn with_markup(mut payload: Value, keyboard: Option<&InlineKeyboard>, parse_mode: Option<ParseMode>) -> Value {
    if let Some(keyboard) = keyboard {
        payload["reply_markup"] = json!(keyboard);
    }
    if let Some(mode) = parse_mode {
        payload["parse_mode"] = json!(mode.as_str());
    }
    payload
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
        parse_mode: Option<ParseMode>,
    ) -> Result<MessageRef, TransportError> {
        let payload = with_markup(json!({"chat_id": chat_id, "text": text}), keyboard, parse_mode);
        let message: Message = self.call("sendMessage", payload).await?;
        Ok(MessageRef {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), TransportError> {
        let payload = with_markup(
            json!({
                "chat_id": message.chat_id,
                "message_id": message.message_id,
                "text": text,
            }),
            keyboard,
            parse_mode,
        );
        // Returns the edited Message, or `true` for inline messages
        let _: Value = self.call("editMessageText", payload).await?;
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        artifact_ref: &str,
        caption: &str,
    ) -> Result<SentAudio, TransportError> {
        let payload = json!({"chat_id": chat_id, "audio": artifact_ref, "caption": caption});
        let message: Message = self.call("sendAudio", payload).await?;
        Ok(SentAudio {
            message_id: message.message_id,
            artifact_ref: message.audio.map(|a| a.file_id),
        })
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "deleteMessage",
                json!({"chat_id": chat_id, "message_id": message_id}),
            )
            .await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TransportError> {
        let mut payload = json!({"callback_query_id": callback_id, "show_alert": show_alert});
        if let Some(text) = text {
            payload["text"] = json!(text);
        }
        let _: bool = self.call("answerCallbackQuery", payload).await?;
        Ok(())
    }
}
