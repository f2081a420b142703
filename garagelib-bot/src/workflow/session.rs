//! Metadata sessions
//!
//! One in-memory session per user holds an upload between turns. A new
//! upload replaces the session wholesale. Terminal states are never stored:
//! the engine removes the session as soon as it reaches one.

use chrono::{DateTime, Utc};
use garagelib_common::db::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::services::ArtistChoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Waiting for the audio file
    AwaitingArtifact,
    /// Artifact received; personal, common, edit or cancel
    AwaitingSaveDestination,
    /// Common save with several artist cards; waiting for the pick
    AwaitingArtistDisambiguation,
    /// Edit sub-flow: waiting for the new title
    AwaitingNewTitle,
    /// Edit sub-flow: waiting for a performer card, then confirmation
    AwaitingPerformerChoice,
    /// Waiting for the name of a new artist card
    AwaitingArtistName,
    /// Published (terminal)
    Saved,
    /// Abandoned by the user (terminal)
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Saved | SessionState::Cancelled)
    }
}

/// State change record, logged by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_state: SessionState,
    pub new_state: SessionState,
    pub transitioned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSession {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub state: SessionState,
    pub artifact_ref: Option<String>,
    pub title: Option<String>,
    pub performer: Option<String>,
    /// Title typed in the edit sub-flow, applied on confirm
    pub draft_title: Option<String>,
    /// Card picked in the edit sub-flow, applied on confirm
    pub pending_artist_choice: Option<ArtistChoice>,
    /// Card confirmed through the edit sub-flow; used by a common save
    pub confirmed_artist: Option<ArtistChoice>,
    /// Step to return to once artist creation finishes
    pub resume_state: Option<SessionState>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl MetadataSession {
    pub fn new(user_id: UserId, state: SessionState) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            state,
            artifact_ref: None,
            title: None,
            performer: None,
            draft_title: None,
            pending_artist_choice: None,
            confirmed_artist: None,
            resume_state: None,
            started_at: now,
            last_activity: now,
        }
    }

    pub fn transition_to(&mut self, new_state: SessionState) -> StateTransition {
        let now = Utc::now();
        let transition = StateTransition {
            session_id: self.session_id,
            old_state: self.state,
            new_state,
            transitioned_at: now,
        };
        self.state = new_state;
        self.last_activity = now;
        transition
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn has_artifact(&self) -> bool {
        self.artifact_ref.is_some()
    }
}

/// Keyed session store
///
/// The lock is held only for a single get/put/remove, never across an
/// external call. Per-user ordering comes from the dispatch queue.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<UserId, MetadataSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: UserId) -> Option<MetadataSession> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    /// Insert or replace the user's session
    pub async fn put(&self, session: MetadataSession) {
        self.sessions.write().await.insert(session.user_id, session);
    }

    pub async fn remove(&self, user_id: UserId) -> Option<MetadataSession> {
        self.sessions.write().await.remove(&user_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than `max_idle`; returns how many
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let cutoff = match chrono::Duration::from_std(max_idle) {
            Ok(max_idle) => Utc::now() - max_idle,
            Err(_) => return 0,
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_activity >= cutoff);
        let swept = before - sessions.len();

        if swept > 0 {
            info!(swept, "Expired idle sessions");
        }
        swept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_records_old_and_new_state() {
        let mut session = MetadataSession::new(42, SessionState::AwaitingArtifact);
        let transition = session.transition_to(SessionState::AwaitingSaveDestination);

        assert_eq!(transition.old_state, SessionState::AwaitingArtifact);
        assert_eq!(transition.new_state, SessionState::AwaitingSaveDestination);
        assert_eq!(transition.session_id, session.session_id);
        assert!(!session.is_terminal());

        session.transition_to(SessionState::Cancelled);
        assert!(session.is_terminal());
    }

    #[tokio::test]
    async fn test_put_replaces_existing_session() {
        let store = SessionStore::new();
        let first = MetadataSession::new(42, SessionState::AwaitingArtifact);
        let second = MetadataSession::new(42, SessionState::AwaitingArtifact);
        let second_id = second.session_id;

        store.put(first).await;
        store.put(second).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(42).await.unwrap().session_id, second_id);
    }

    #[tokio::test]
    async fn test_sweep_idle_removes_only_stale_sessions() {
        let store = SessionStore::new();
        let mut stale = MetadataSession::new(1, SessionState::AwaitingArtifact);
        stale.last_activity = Utc::now() - chrono::Duration::hours(2);
        store.put(stale).await;
        store
            .put(MetadataSession::new(2, SessionState::AwaitingArtifact))
            .await;

        let swept = store.sweep_idle(Duration::from_secs(3600)).await;

        assert_eq!(swept, 1);
        assert!(store.get(1).await.is_none());
        assert!(store.get(2).await.is_some());
    }
}
