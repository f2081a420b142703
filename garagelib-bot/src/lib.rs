//! garagelib-bot library interface
//!
//! The binary wires these together; integration tests drive them directly
//! through [`transport::RecordingTransport`].

pub mod api;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod menus;
pub mod runner;
pub mod services;
pub mod transport;
pub mod workflow;

pub use crate::error::{TransportError, WorkflowError, WorkflowResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::workflow::SessionStore;

/// State shared with HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: SessionStore,
    pub bot_version: String,
    /// Startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, sessions: SessionStore, bot_version: impl Into<String>) -> Self {
        Self {
            db,
            sessions,
            bot_version: bot_version.into(),
            startup_time: Utc::now(),
        }
    }
}

/// Build the health router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .with_state(state)
}
