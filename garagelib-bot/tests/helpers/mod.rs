//! Shared harness: in-memory catalog, recording transport, real dispatcher

#![allow(dead_code)]

use garagelib_bot::dispatch::Dispatcher;
use garagelib_bot::services::{CatalogBrowser, PublishPipeline};
use garagelib_bot::transport::{Incoming, IncomingArtifact, InlineKeyboard, RecordingTransport, Sender};
use garagelib_bot::workflow::{MetadataSession, SessionState, SessionStore, UploadWorkflow};
use garagelib_common::db::{init_memory_database, UserId};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const STORAGE_CHAT: i64 = -100_500;

pub fn user(id: UserId, name: &str) -> Sender {
    Sender {
        id,
        first_name: name.to_string(),
        full_name: name.to_string(),
    }
}

pub struct Harness {
    pub pool: SqlitePool,
    pub transport: Arc<RecordingTransport>,
    pub sessions: SessionStore,
    pub dispatcher: Arc<Dispatcher>,
    callbacks: AtomicU64,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_transport(RecordingTransport::new()).await
    }

    pub async fn with_transport(transport: RecordingTransport) -> Self {
        let pool = init_memory_database().await.unwrap();
        let transport = Arc::new(transport);
        let sessions = SessionStore::new();

        let pipeline = PublishPipeline::new(
            pool.clone(),
            transport.clone(),
            Some(STORAGE_CHAT),
            Duration::ZERO,
        );
        let workflow = UploadWorkflow::new(pool.clone(), sessions.clone(), pipeline);
        let browser = CatalogBrowser::new(pool.clone(), transport.clone(), Some(STORAGE_CHAT), "v1.1");
        let dispatcher = Arc::new(Dispatcher::new(workflow, browser, transport.clone()));

        Self {
            pool,
            transport,
            sessions,
            dispatcher,
            callbacks: AtomicU64::new(0),
        }
    }

    pub async fn start(&self, sender: &Sender) {
        self.dispatcher
            .handle(Incoming::Start {
                sender: sender.clone(),
                chat_id: sender.id,
            })
            .await;
    }

    /// Press an inline button carrying `token`
    pub async fn press(&self, sender: &Sender, token: &str) {
        self.dispatcher.handle(callback(sender, token, self.next_callback_id())).await;
    }

    pub async fn say(&self, sender: &Sender, text: &str) {
        self.dispatcher
            .handle(Incoming::Text {
                sender: sender.clone(),
                chat_id: sender.id,
                text: text.to_string(),
            })
            .await;
    }

    pub async fn upload(&self, sender: &Sender, artifact_ref: &str, title: Option<&str>, performer: Option<&str>) {
        self.dispatcher
            .handle(audio(sender, artifact_ref, title, performer))
            .await;
    }

    pub async fn session(&self, user_id: UserId) -> Option<MetadataSession> {
        self.sessions.get(user_id).await
    }

    pub async fn state(&self, user_id: UserId) -> Option<SessionState> {
        self.session(user_id).await.map(|s| s.state)
    }

    pub async fn last_keyboard(&self, chat: i64) -> InlineKeyboard {
        self.transport
            .last_screen(chat)
            .await
            .and_then(|(_, keyboard)| keyboard)
            .expect("no keyboard shown")
    }

    pub async fn last_text(&self, chat: i64) -> String {
        self.transport
            .last_screen(chat)
            .await
            .map(|(text, _)| text)
            .expect("nothing shown")
    }

    fn next_callback_id(&self) -> String {
        format!("cb-{}", self.callbacks.fetch_add(1, Ordering::SeqCst))
    }
}

pub fn callback(sender: &Sender, token: &str, callback_id: String) -> Incoming {
    Incoming::Callback {
        sender: sender.clone(),
        callback_id,
        origin: None,
        data: token.to_string(),
    }
}

pub fn audio(sender: &Sender, artifact_ref: &str, title: Option<&str>, performer: Option<&str>) -> Incoming {
    Incoming::Artifact {
        sender: sender.clone(),
        chat_id: sender.id,
        artifact: IncomingArtifact {
            artifact_ref: artifact_ref.to_string(),
            title: title.map(str::to_string),
            performer: performer.map(str::to_string),
        },
    }
}
