//! Upload/publish workflow

pub mod engine;
pub mod outcome;
pub mod screens;
pub mod session;

pub use engine::UploadWorkflow;
pub use outcome::{Outcome, Screen};
pub use screens::escape_markdown;
pub use session::{MetadataSession, SessionState, SessionStore, StateTransition};
