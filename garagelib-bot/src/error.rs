//! Error types for garagelib-bot
//!
//! [`TransportError`] covers failed calls to the chat transport.
//! [`WorkflowError`] is what a conversational turn can fail with; it never
//! leaves a turn; [`WorkflowError::into_outcome`] turns it into something
//! the user sees.

use thiserror::Error;

use crate::menus;
use crate::workflow::{Outcome, Screen};

/// Chat transport failures
#[derive(Debug, Error)]
pub enum TransportError {
    /// Bot blocked, kicked, or otherwise not allowed to write (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid chat, message or payload (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Flood control; retry after the given number of seconds (429)
    #[error("Rate limited, retry after {0}s")]
    RetryAfter(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(i64, String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Failure of one conversational turn
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Empty input, malformed callback token, or action not valid now
    #[error("{0}")]
    Validation(String),

    /// Referenced track or artist card no longer exists
    #[error("{0}")]
    NotFound(String),

    /// Acting on another user's record
    #[error("{0}")]
    PermissionDenied(String),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] garagelib_common::Error),
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

/// Shown when a turn fails for reasons the user cannot fix
pub const GENERIC_FAILURE_TEXT: &str = "⚠️ Something went wrong. Please try again.";

impl WorkflowError {
    /// Problems the user caused and can correct
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            WorkflowError::Validation(_)
                | WorkflowError::NotFound(_)
                | WorkflowError::PermissionDenied(_)
        )
    }

    /// User-facing rendering of this error
    pub fn into_outcome(self) -> Outcome {
        match self {
            WorkflowError::Validation(alert)
            | WorkflowError::NotFound(alert)
            | WorkflowError::PermissionDenied(alert) => Outcome::Rejected { alert, retry: None },
            WorkflowError::Transport(_) | WorkflowError::Catalog(_) => Outcome::Failed(
                Screen::new(GENERIC_FAILURE_TEXT).with_keyboard(menus::main_menu()),
            ),
        }
    }
}
