//! # GarageLib Common Library
//!
//! Shared code for the GarageLib bot crates:
//! - Catalog database initialization, schema sync and migrations
//! - Catalog record models (users, artist identities, tracks)
//! - Configuration loading and root folder resolution
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
