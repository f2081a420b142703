//! HTTP surface of garagelib-bot
//!
//! Only a health endpoint; the bot itself talks over the chat transport.

pub mod health;

pub use health::health_routes;
