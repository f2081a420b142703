//! Turning an [`Outcome`] into transport calls
//!
//! Screens answering a keyboard press replace the message that carried the
//! keyboard; when that edit fails a new message is sent instead. A screen
//! whose Markdown the transport rejects is sent again as plain text.
//! Every keyboard press is answered exactly once.

use tracing::{debug, warn};

use crate::error::TransportError;
use crate::transport::{ChatId, Incoming, MessageRef, Transport};
use crate::workflow::{Outcome, Screen};

const AUDIO_FAILED_TEXT: &str = "⚠️ Could not send the audio file.";

/// Telegram refuses an edit that changes nothing; the screen is already shown
fn is_not_modified(e: &TransportError) -> bool {
    matches!(e, TransportError::BadRequest(reason) if reason.contains("message is not modified"))
}

async fn edit_screen(
    transport: &dyn Transport,
    message: MessageRef,
    screen: &Screen,
) -> Result<(), TransportError> {
    let keyboard = screen.keyboard.as_ref();
    match transport
        .edit_text(message, &screen.text, keyboard, screen.parse_mode)
        .await
    {
        Err(e) if is_not_modified(&e) => Ok(()),
        Err(TransportError::BadRequest(reason)) if screen.parse_mode.is_some() => {
            debug!(reason = %reason, "Formatted edit rejected, retrying as plain text");
            transport
                .edit_text(message, &screen.plain_text(), keyboard, None)
                .await
        }
        other => other,
    }
}

async fn send_screen(
    transport: &dyn Transport,
    chat_id: ChatId,
    screen: &Screen,
) -> Result<(), TransportError> {
    let keyboard = screen.keyboard.as_ref();
    match transport
        .send_text(chat_id, &screen.text, keyboard, screen.parse_mode)
        .await
    {
        Ok(_) => Ok(()),
        Err(TransportError::BadRequest(reason)) if screen.parse_mode.is_some() => {
            debug!(chat_id, reason = %reason, "Formatted message rejected, resending as plain text");
            transport
                .send_text(chat_id, &screen.plain_text(), keyboard, None)
                .await
                .map(|_| ())
        }
        Err(e) => Err(e),
    }
}

/// Edit the origin message if there is one, else (or on failure) send
async fn show(transport: &dyn Transport, chat_id: ChatId, origin: Option<MessageRef>, screen: &Screen) {
    if let Some(message) = origin {
        match edit_screen(transport, message, screen).await {
            Ok(()) => return,
            Err(e) => debug!(chat_id, error = %e, "Edit failed, sending a new message"),
        }
    }

    if let Err(e) = send_screen(transport, chat_id, screen).await {
        warn!(chat_id, error = %e, "Could not deliver reply");
    }
}

async fn answer(transport: &dyn Transport, callback_id: Option<&str>, alert: Option<&str>) {
    let Some(callback_id) = callback_id else {
        return;
    };
    if let Err(e) = transport
        .answer_callback(callback_id, alert, alert.is_some())
        .await
    {
        debug!(error = %e, "Callback answer failed");
    }
}

/// Show an alert: a popup for keyboard presses, a plain message otherwise
async fn alert(transport: &dyn Transport, chat_id: ChatId, callback_id: Option<&str>, text: &str) {
    match callback_id {
        Some(_) => answer(transport, callback_id, Some(text)).await,
        None => {
            if let Err(e) = transport.send_text(chat_id, text, None, None).await {
                warn!(chat_id, error = %e, "Could not deliver alert");
            }
        }
    }
}

pub async fn render(transport: &dyn Transport, incoming: &Incoming, outcome: Outcome) {
    let chat_id = incoming.chat_id();
    let (callback_id, origin) = match incoming {
        Incoming::Callback {
            callback_id,
            origin,
            ..
        } => (Some(callback_id.as_str()), *origin),
        _ => (None, None),
    };

    match outcome {
        Outcome::Prompt(screen) | Outcome::Finished(screen) | Outcome::Failed(screen) => {
            answer(transport, callback_id, None).await;
            show(transport, chat_id, origin, &screen).await;
        }
        Outcome::Rejected { alert: text, retry } => {
            alert(transport, chat_id, callback_id, &text).await;
            if let Some(screen) = retry {
                show(transport, chat_id, origin, &screen).await;
            }
        }
        Outcome::Audio {
            artifact_ref,
            caption,
        } => match transport.send_audio(chat_id, &artifact_ref, &caption).await {
            Ok(_) => answer(transport, callback_id, None).await,
            Err(e) => {
                warn!(chat_id, error = %e, "Could not re-send audio");
                alert(transport, chat_id, callback_id, AUDIO_FAILED_TEXT).await;
            }
        },
    }
}
