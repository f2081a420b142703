//! Routing of incoming updates
//!
//! One [`Incoming`] is one turn: it is routed to the upload workflow or the
//! catalog browser, any error is mapped to an outcome, and the outcome is
//! rendered. Turns never return errors to the caller.

pub mod command;
pub mod queue;
pub mod render;

pub use command::Command;
pub use queue::UserQueues;

use garagelib_common::db::Visibility;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::WorkflowResult;
use crate::services::CatalogBrowser;
use crate::transport::{Incoming, Sender, Transport};
use crate::workflow::{Outcome, SessionStore, UploadWorkflow};

pub struct Dispatcher {
    workflow: UploadWorkflow,
    browser: CatalogBrowser,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(workflow: UploadWorkflow, browser: CatalogBrowser, transport: Arc<dyn Transport>) -> Self {
        Self {
            workflow,
            browser,
            transport,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        self.workflow.sessions()
    }

    /// Run one turn to completion, including rendering
    pub async fn handle(&self, incoming: Incoming) {
        let user_id = incoming.sender().id;

        let outcome = match self.route(&incoming).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_user_facing() {
                    debug!(user_id, error = %e, "Turn rejected");
                } else {
                    error!(user_id, error = %e, "Turn failed");
                }
                e.into_outcome()
            }
        };

        render::render(self.transport.as_ref(), &incoming, outcome).await;
    }

    async fn route(&self, incoming: &Incoming) -> WorkflowResult<Outcome> {
        match incoming {
            Incoming::Start { sender, .. } => self.browser.start(sender).await,
            Incoming::Text { sender, text, .. } => self.workflow.on_text(sender.id, text).await,
            Incoming::Artifact {
                sender, artifact, ..
            } => self.workflow.on_artifact_received(sender, artifact).await,
            Incoming::Callback { sender, data, .. } => {
                let command = Command::parse(data)?;
                debug!(user_id = sender.id, ?command, "Callback");
                self.route_command(sender, command).await
            }
        }
    }

    async fn route_command(&self, sender: &Sender, command: Command) -> WorkflowResult<Outcome> {
        let user_id = sender.id;
        match command {
            Command::AddTrack => self.workflow.begin_upload(sender).await,
            Command::SavePersonal => {
                self.workflow
                    .choose_save_destination(user_id, Visibility::Personal)
                    .await
            }
            Command::SaveCommon => {
                self.workflow
                    .choose_save_destination(user_id, Visibility::Common)
                    .await
            }
            Command::CancelUpload | Command::CancelMetadata => {
                self.workflow.cancel_session(user_id).await
            }
            Command::EditMetadata => self.workflow.begin_metadata_edit(user_id).await,
            Command::MetaArtist(artist_id) => {
                self.workflow
                    .on_artist_chosen_for_edit(user_id, artist_id)
                    .await
            }
            Command::ConfirmMetadata => self.workflow.confirm_edit(user_id).await,
            Command::ChooseArtist(artist_id) => {
                self.workflow
                    .choose_artist_for_publish(user_id, artist_id)
                    .await
            }
            Command::CreateArtistCard => self.workflow.begin_artist_creation(sender).await,
            Command::CancelArtistCard => self.workflow.cancel_artist_creation(user_id).await,

            Command::MyCatalog => self.browser.my_catalog(user_id).await,
            Command::CommonPlaylist => self.browser.common_playlist().await,
            Command::MyArtists => self.browser.my_artists(user_id).await,
            Command::ViewArtist(artist_id) => self.browser.view_artist(user_id, artist_id).await,
            Command::DeleteArtist(artist_id) => {
                self.browser.delete_artist(user_id, artist_id).await
            }
            Command::PlayTrack(track_id) => self.browser.view_track(user_id, track_id).await,
            Command::ListenTrack(track_id) => self.browser.listen(track_id).await,
            Command::DeleteTrack(track_id) => self.browser.delete_track(user_id, track_id).await,
            Command::BackMain => Ok(self.browser.main_menu()),
            Command::About => Ok(self.browser.about()),
        }
    }
}
