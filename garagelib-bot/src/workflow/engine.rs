//! Upload workflow engine
//!
//! Every entry point loads the user's session, checks the step it is valid
//! in, performs at most one external side effect chain and stores the
//! updated session. An action sent in the wrong step is refused with an
//! alert and the current step is shown again; the session is left as is.
//!
//! Persistence happens only in [`UploadWorkflow::publish`], which is also
//! the only place a session reaches `Saved`.

use garagelib_common::db::{
    truncate_artist_name, ArtistId, UserId, Visibility, DEFAULT_TITLE,
};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use super::outcome::{Outcome, Screen};
use super::screens::{self, NO_UPLOAD_TEXT, OUT_OF_STEP_TEXT};
use super::session::{MetadataSession, SessionState, SessionStore, StateTransition};
use crate::db;
use crate::error::{WorkflowError, WorkflowResult};
use crate::services::{ArtistChoice, ArtistResolver, Attribution, PublishPipeline, PublishRequest};
use crate::transport::{IncomingArtifact, Sender};

const PUBLISH_FAILED_TEXT: &str = "⚠️ Could not save the track. Please try again.";

pub struct UploadWorkflow {
    db: SqlitePool,
    sessions: SessionStore,
    resolver: ArtistResolver,
    pipeline: PublishPipeline,
}

fn log_transition(user_id: UserId, transition: &StateTransition) {
    debug!(
        user_id,
        session_id = %transition.session_id,
        from = ?transition.old_state,
        to = ?transition.new_state,
        "Session transition"
    );
}

impl UploadWorkflow {
    pub fn new(db: SqlitePool, sessions: SessionStore, pipeline: PublishPipeline) -> Self {
        Self {
            resolver: ArtistResolver::new(db.clone()),
            db,
            sessions,
            pipeline,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    async fn transition_and_store(&self, session: &mut MetadataSession, state: SessionState) {
        let transition = session.transition_to(state);
        log_transition(session.user_id, &transition);
        self.sessions.put(session.clone()).await;
    }

    /// Prompt for whatever the session is waiting on
    async fn state_prompt(&self, session: &MetadataSession) -> WorkflowResult<Screen> {
        let screen = match session.state {
            SessionState::AwaitingArtifact => screens::upload_prompt(),
            SessionState::AwaitingSaveDestination => screens::save_destination_screen(
                session.title.as_deref().unwrap_or(DEFAULT_TITLE),
                session.performer.as_deref().unwrap_or_default(),
            ),
            SessionState::AwaitingArtistDisambiguation => {
                let artists = db::list_artists_for_user(&self.db, session.user_id).await?;
                screens::disambiguation_screen(&artists)
            }
            SessionState::AwaitingNewTitle => screens::title_prompt(),
            SessionState::AwaitingPerformerChoice => match &session.pending_artist_choice {
                Some(choice) => screens::edit_confirm_screen(
                    session.draft_title.as_deref().unwrap_or(DEFAULT_TITLE),
                    &choice.name,
                ),
                None => {
                    let artists = db::list_artists_for_user(&self.db, session.user_id).await?;
                    screens::performer_choice_screen(&artists)
                }
            },
            SessionState::AwaitingArtistName => screens::artist_name_prompt(),
            SessionState::Saved | SessionState::Cancelled => screens::main_menu_screen("🏠 Main menu:"),
        };
        Ok(screen)
    }

    /// Refusal for an action sent outside the step it belongs to
    async fn out_of_step(&self, session: Option<MetadataSession>) -> WorkflowResult<Outcome> {
        match session {
            Some(session) => {
                debug!(user_id = session.user_id, state = ?session.state, "Action out of step");
                let retry = self.state_prompt(&session).await?;
                Ok(Outcome::rejected(OUT_OF_STEP_TEXT, Some(retry)))
            }
            None => Ok(Outcome::rejected(NO_UPLOAD_TEXT, None)),
        }
    }

    /// Start an upload; any previous session is discarded
    pub async fn begin_upload(&self, user: &Sender) -> WorkflowResult<Outcome> {
        db::add_user(&self.db, user.id, &user.full_name).await?;

        if self.sessions.remove(user.id).await.is_some() {
            debug!(user_id = user.id, "Previous session replaced");
        }
        let session = MetadataSession::new(user.id, SessionState::AwaitingArtifact);
        info!(user_id = user.id, session_id = %session.session_id, "Upload started");
        self.sessions.put(session).await;

        Ok(Outcome::Prompt(screens::upload_prompt()))
    }

    /// Audio arrived: fill defaults from its tags and ask for a destination.
    ///
    /// Outside `AwaitingArtifact` the artifact starts a fresh session.
    pub async fn on_artifact_received(
        &self,
        user: &Sender,
        artifact: &IncomingArtifact,
    ) -> WorkflowResult<Outcome> {
        db::add_user(&self.db, user.id, &user.full_name).await?;

        let mut session = match self.sessions.get(user.id).await {
            Some(session) if session.state == SessionState::AwaitingArtifact => session,
            _ => MetadataSession::new(user.id, SessionState::AwaitingArtifact),
        };

        let title = artifact
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let performer = artifact
            .performer
            .clone()
            .unwrap_or_else(|| user.full_name.clone());

        session.artifact_ref = Some(artifact.artifact_ref.clone());
        session.title = Some(title.clone());
        session.performer = Some(performer.clone());
        self.transition_and_store(&mut session, SessionState::AwaitingSaveDestination)
            .await;

        Ok(Outcome::Prompt(screens::save_destination_screen(
            &title, &performer,
        )))
    }

    pub async fn begin_metadata_edit(&self, user_id: UserId) -> WorkflowResult<Outcome> {
        let mut session = match self.sessions.get(user_id).await {
            Some(session)
                if session.has_artifact()
                    && matches!(
                        session.state,
                        SessionState::AwaitingSaveDestination
                            | SessionState::AwaitingArtistDisambiguation
                    ) =>
            {
                session
            }
            other => return self.out_of_step(other).await,
        };

        session.draft_title = None;
        session.pending_artist_choice = None;
        self.transition_and_store(&mut session, SessionState::AwaitingNewTitle)
            .await;

        Ok(Outcome::Prompt(screens::title_prompt()))
    }

    pub async fn on_title_provided(&self, user_id: UserId, text: &str) -> WorkflowResult<Outcome> {
        let mut session = match self.sessions.get(user_id).await {
            Some(session) if session.state == SessionState::AwaitingNewTitle => session,
            other => return self.out_of_step(other).await,
        };

        let title = text.trim();
        if title.is_empty() {
            return Ok(Outcome::rejected(
                "⚠️ Title cannot be empty. Enter it again:",
                Some(screens::title_prompt()),
            ));
        }

        session.draft_title = Some(title.to_string());
        session.pending_artist_choice = None;
        let artists = db::list_artists_for_user(&self.db, user_id).await?;
        self.transition_and_store(&mut session, SessionState::AwaitingPerformerChoice)
            .await;

        Ok(Outcome::Prompt(screens::performer_choice_screen(&artists)))
    }

    pub async fn on_artist_chosen_for_edit(
        &self,
        user_id: UserId,
        artist_id: ArtistId,
    ) -> WorkflowResult<Outcome> {
        let mut session = match self.sessions.get(user_id).await {
            Some(session) if session.state == SessionState::AwaitingPerformerChoice => session,
            other => return self.out_of_step(other).await,
        };

        match self.resolver.resolve_chosen(user_id, artist_id).await {
            Ok(choice) => {
                let screen = screens::edit_confirm_screen(
                    session.draft_title.as_deref().unwrap_or(DEFAULT_TITLE),
                    &choice.name,
                );
                session.pending_artist_choice = Some(choice);
                self.transition_and_store(&mut session, SessionState::AwaitingPerformerChoice)
                    .await;
                Ok(Outcome::Prompt(screen))
            }
            Err(WorkflowError::NotFound(alert)) => {
                let artists = db::list_artists_for_user(&self.db, user_id).await?;
                Ok(Outcome::rejected(
                    alert,
                    Some(screens::performer_choice_screen(&artists)),
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Apply the edited title and performer; the artifact is kept
    pub async fn confirm_edit(&self, user_id: UserId) -> WorkflowResult<Outcome> {
        let mut session = match self.sessions.get(user_id).await {
            Some(session) if session.state == SessionState::AwaitingPerformerChoice => session,
            other => return self.out_of_step(other).await,
        };

        let Some(choice) = session.pending_artist_choice.take() else {
            let artists = db::list_artists_for_user(&self.db, user_id).await?;
            return Ok(Outcome::rejected(
                "Choose a performer first.",
                Some(screens::performer_choice_screen(&artists)),
            ));
        };

        if let Some(title) = session.draft_title.take() {
            session.title = Some(title);
        }
        session.performer = Some(choice.name.clone());
        session.confirmed_artist = Some(choice);
        self.transition_and_store(&mut session, SessionState::AwaitingSaveDestination)
            .await;

        let screen = screens::save_destination_screen(
            session.title.as_deref().unwrap_or(DEFAULT_TITLE),
            session.performer.as_deref().unwrap_or_default(),
        );
        Ok(Outcome::Prompt(screen.prefixed("✅ Metadata updated!")))
    }

    /// Drop the session without side effects
    pub async fn cancel_session(&self, user_id: UserId) -> WorkflowResult<Outcome> {
        if let Some(mut session) = self.sessions.remove(user_id).await {
            let transition = session.transition_to(SessionState::Cancelled);
            log_transition(user_id, &transition);
        }

        Ok(Outcome::Finished(screens::main_menu_screen(
            "❌ Cancelled. Back to the main menu.",
        )))
    }

    pub async fn choose_save_destination(
        &self,
        user_id: UserId,
        visibility: Visibility,
    ) -> WorkflowResult<Outcome> {
        let mut session = match self.sessions.get(user_id).await {
            Some(session)
                if session.state == SessionState::AwaitingSaveDestination
                    && session.has_artifact() =>
            {
                session
            }
            other => return self.out_of_step(other).await,
        };

        if visibility == Visibility::Personal {
            return self.publish(session, None).await;
        }

        // A card confirmed in the edit sub-flow skips resolution if it still exists
        if let Some(confirmed) = session.confirmed_artist.take() {
            match self.resolver.resolve_chosen(user_id, confirmed.id).await {
                Ok(choice) => return self.publish(session, Some(choice)).await,
                Err(WorkflowError::NotFound(_)) => {
                    warn!(user_id, artist_id = confirmed.id, "Confirmed artist card is gone, resolving again");
                }
                Err(e) => return Err(e),
            }
        }

        let fallback = session.performer.clone().unwrap_or_default();
        match self.resolver.resolve(user_id, &fallback).await? {
            Attribution::Resolved(choice) => self.publish(session, Some(choice)).await,
            Attribution::DisambiguationRequired(candidates) => {
                self.transition_and_store(&mut session, SessionState::AwaitingArtistDisambiguation)
                    .await;
                Ok(Outcome::Prompt(screens::disambiguation_screen(&candidates)))
            }
        }
    }

    /// Publish under an explicitly chosen card
    pub async fn choose_artist_for_publish(
        &self,
        user_id: UserId,
        artist_id: ArtistId,
    ) -> WorkflowResult<Outcome> {
        let mut session = match self.sessions.get(user_id).await {
            Some(session) if session.state == SessionState::AwaitingArtistDisambiguation => session,
            other => return self.out_of_step(other).await,
        };

        match self.resolver.resolve_chosen(user_id, artist_id).await {
            Ok(choice) => self.publish(session, Some(choice)).await,
            Err(WorkflowError::NotFound(alert)) => {
                // Restart attribution from the cards that exist now
                let artists = db::list_artists_for_user(&self.db, user_id).await?;
                if artists.len() > 1 {
                    return Ok(Outcome::rejected(
                        alert,
                        Some(screens::disambiguation_screen(&artists)),
                    ));
                }
                self.transition_and_store(&mut session, SessionState::AwaitingSaveDestination)
                    .await;
                let retry = self.state_prompt(&session).await?;
                Ok(Outcome::rejected(alert, Some(retry)))
            }
            Err(e) => Err(e),
        }
    }

    /// Ask for a new artist card name, remembering the step to return to
    pub async fn begin_artist_creation(&self, user: &Sender) -> WorkflowResult<Outcome> {
        db::add_user(&self.db, user.id, &user.full_name).await?;

        let mut session = self
            .sessions
            .get(user.id)
            .await
            .unwrap_or_else(|| MetadataSession::new(user.id, SessionState::AwaitingArtistName));

        if session.state != SessionState::AwaitingArtistName {
            session.resume_state = Some(session.state);
        }
        self.transition_and_store(&mut session, SessionState::AwaitingArtistName)
            .await;

        Ok(Outcome::Prompt(screens::artist_name_prompt()))
    }

    /// Abandon the new card; an interrupted upload continues where it was
    pub async fn cancel_artist_creation(&self, user_id: UserId) -> WorkflowResult<Outcome> {
        let mut session = match self.sessions.get(user_id).await {
            Some(session) if session.state == SessionState::AwaitingArtistName => session,
            None => return self.cancel_session(user_id).await,
            other => return self.out_of_step(other).await,
        };

        match session.resume_state.take() {
            Some(resume) => {
                self.transition_and_store(&mut session, resume).await;
                Ok(Outcome::Prompt(self.state_prompt(&session).await?))
            }
            None => self.cancel_session(user_id).await,
        }
    }

    pub async fn on_artist_name_provided(&self, user_id: UserId, text: &str) -> WorkflowResult<Outcome> {
        let mut session = match self.sessions.get(user_id).await {
            Some(session) if session.state == SessionState::AwaitingArtistName => session,
            other => return self.out_of_step(other).await,
        };

        let name = truncate_artist_name(text.trim());
        if name.is_empty() {
            return Ok(Outcome::rejected(
                "Name cannot be empty. Enter it again:",
                Some(screens::artist_name_prompt()),
            ));
        }

        let artist_id = db::add_artist(&self.db, user_id, &name).await?;
        info!(user_id, artist_id, "Artist card created");
        let created = format!("✅ Artist card «{}» created!", name);

        match session.resume_state.take() {
            Some(resume) => {
                self.transition_and_store(&mut session, resume).await;
                let screen = self.state_prompt(&session).await?;
                Ok(Outcome::Prompt(screen.prefixed(&created)))
            }
            None => {
                self.sessions.remove(user_id).await;
                Ok(Outcome::Finished(screens::main_menu_screen(created)))
            }
        }
    }

    /// Route free text to whichever step is waiting for it
    pub async fn on_text(&self, user_id: UserId, text: &str) -> WorkflowResult<Outcome> {
        match self.sessions.get(user_id).await.map(|s| s.state) {
            Some(SessionState::AwaitingNewTitle) => self.on_title_provided(user_id, text).await,
            Some(SessionState::AwaitingArtistName) => {
                self.on_artist_name_provided(user_id, text).await
            }
            Some(SessionState::AwaitingArtifact) => Ok(Outcome::rejected(
                "🎵 Please send an audio file.",
                Some(screens::upload_prompt()),
            )),
            _ => Ok(Outcome::Prompt(screens::main_menu_screen(
                "Use the menu below 👇",
            ))),
        }
    }

    /// The `Saved` transition: run the publish pipeline and clear the session.
    ///
    /// `artist` present means a common publish. On a catalog failure the
    /// session is kept so the user can retry from the same step.
    async fn publish(
        &self,
        mut session: MetadataSession,
        artist: Option<ArtistChoice>,
    ) -> WorkflowResult<Outcome> {
        let user_id = session.user_id;
        let Some(artifact_ref) = session.artifact_ref.clone() else {
            return self.out_of_step(Some(session)).await;
        };

        let title = session
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let (visibility, performer, artist_id) = match &artist {
            Some(choice) => (Visibility::Common, choice.name.clone(), Some(choice.id)),
            None => (
                Visibility::Personal,
                session.performer.clone().unwrap_or_default(),
                None,
            ),
        };

        let request = PublishRequest {
            user_id,
            artifact_ref,
            title: title.clone(),
            performer: performer.clone(),
            artist_id,
            visibility,
        };

        match self.pipeline.publish(&request).await {
            Ok(report) => {
                let transition = session.transition_to(SessionState::Saved);
                log_transition(user_id, &transition);
                self.sessions.remove(user_id).await;
                debug!(user_id, track_id = report.track_id, "Session finished");

                let text = match visibility {
                    Visibility::Personal => {
                        format!("✅ Track «{}» saved to your personal catalog.", title)
                    }
                    Visibility::Common => format!(
                        "🌍 Track «{}» added to the common playlist as «{}».",
                        title, performer
                    ),
                };
                Ok(Outcome::Finished(screens::main_menu_screen(text)))
            }
            Err(e) => {
                error!(user_id, error = %e, "Publish failed, session kept for retry");
                let retry = self.state_prompt(&session).await?;
                Ok(Outcome::Failed(retry.prefixed(PUBLISH_FAILED_TEXT)))
            }
        }
    }
}
