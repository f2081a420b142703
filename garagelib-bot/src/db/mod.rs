//! Catalog store operations
//!
//! Free async functions over a shared `SqlitePool`. Each logical write is a
//! single statement; nothing here opens a multi-statement transaction.

pub mod artists;
pub mod bot_meta;
pub mod tracks;
pub mod users;

pub use artists::*;
pub use bot_meta::*;
pub use tracks::*;
pub use users::*;
