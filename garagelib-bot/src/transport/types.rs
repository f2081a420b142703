//! Bot API wire types
//!
//! Only the fields the bot reads are declared; everything else in the JSON is
//! ignored.

use serde::Deserialize;

use super::{Incoming, IncomingArtifact, MessageRef, Sender};

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub audio: Option<Audio>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

impl From<User> for Sender {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        Sender {
            id: user.id,
            first_name: user.first_name,
            full_name,
        }
    }
}

/// Audio file with the ID3-style tags the transport extracted
#[derive(Debug, Clone, Deserialize)]
pub struct Audio {
    pub file_id: String,
    pub title: Option<String>,
    pub performer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

impl Update {
    /// Classify the update; `None` for kinds the bot does not handle
    pub fn into_incoming(self) -> Option<Incoming> {
        if let Some(query) = self.callback_query {
            let data = query.data?;
            let origin = query.message.map(|m| MessageRef {
                chat_id: m.chat.id,
                message_id: m.message_id,
            });
            return Some(Incoming::Callback {
                sender: query.from.into(),
                callback_id: query.id,
                origin,
                data,
            });
        }

        let Message {
            chat,
            from,
            text,
            audio,
            ..
        } = self.message?;
        let sender: Sender = from?.into();
        let chat_id = chat.id;

        if let Some(audio) = audio {
            return Some(Incoming::Artifact {
                sender,
                chat_id,
                artifact: IncomingArtifact {
                    artifact_ref: audio.file_id,
                    title: non_blank(audio.title),
                    performer: non_blank(audio.performer),
                },
            });
        }

        let text = text?;
        if is_start_command(&text) {
            Some(Incoming::Start { sender, chat_id })
        } else {
            Some(Incoming::Text {
                sender,
                chat_id,
                text,
            })
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `/start`, optionally addressed as `/start@BotName` or with a payload
fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or("");
    command == "/start" || command.starts_with("/start@")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Option<Incoming> {
        serde_json::from_value::<Update>(value).unwrap().into_incoming()
    }

    #[test]
    fn test_audio_message_carries_tags() {
        let incoming = parse(json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "date": 0,
                "chat": {"id": 42, "type": "private"},
                "from": {"id": 42, "is_bot": false, "first_name": "Max", "last_name": "Power"},
                "audio": {"file_id": "file-1", "file_unique_id": "u1", "duration": 90,
                          "title": "Demo", "performer": "  "}
            }
        }))
        .unwrap();

        match incoming {
            Incoming::Artifact {
                sender, artifact, ..
            } => {
                assert_eq!(sender.full_name, "Max Power");
                assert_eq!(artifact.title.as_deref(), Some("Demo"));
                assert_eq!(artifact.performer, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_start_command_variants() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("/start@GarageLibBot"));
        assert!(is_start_command("/start promo"));
        assert!(!is_start_command("/started"));
        assert!(!is_start_command("start"));
    }

    #[test]
    fn test_callback_uses_origin_chat() {
        let incoming = parse(json!({
            "update_id": 2,
            "callback_query": {
                "id": "cb-1",
                "from": {"id": 42, "is_bot": false, "first_name": "Max"},
                "chat_instance": "x",
                "message": {"message_id": 77, "date": 0, "chat": {"id": 42, "type": "private"}},
                "data": "save_common"
            }
        }))
        .unwrap();

        assert_eq!(incoming.chat_id(), 42);
        assert!(matches!(
            incoming,
            Incoming::Callback { origin: Some(MessageRef { message_id: 77, .. }), .. }
        ));
    }

    #[test]
    fn test_unhandled_update_kinds_are_skipped() {
        assert!(parse(json!({"update_id": 3})).is_none());
        assert!(parse(json!({
            "update_id": 4,
            "message": {"message_id": 1, "date": 0, "chat": {"id": -100, "type": "channel"}}
        }))
        .is_none());
    }
}
