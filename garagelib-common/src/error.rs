//! Common error types for GarageLib

use thiserror::Error;

/// Common result type for GarageLib operations
pub type Result<T> = std::result::Result<T, Error>;

/// Catalog and configuration failures shared by GarageLib crates
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Root folder or config file I/O
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing, unreadable or malformed setting
    #[error("Configuration error: {0}")]
    Config(String),
}
