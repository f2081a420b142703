//! Startup version announcement
//!
//! Broadcasts "the bot was updated" to every known user at most once per
//! version string.

use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, info};

use super::notification_fanout::{broadcast, FanoutReport};
use crate::db;
use crate::transport::Transport;

pub fn announcement_text(version: &str, release_notes: Option<&str>) -> String {
    match release_notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(notes) => format!("🆕 GarageLib {} is out!\n\n{}", version, notes),
        None => format!("🆕 GarageLib has been updated to {}.", version),
    }
}

/// Announce `version` unless it was already announced.
///
/// Returns `None` when nothing was sent.
pub async fn announce_version(
    pool: &SqlitePool,
    transport: &dyn Transport,
    version: &str,
    release_notes: Option<&str>,
    delay: Duration,
) -> garagelib_common::Result<Option<FanoutReport>> {
    if db::has_version_been_announced(pool, version).await? {
        debug!(version, "Version already announced");
        return Ok(None);
    }

    // Marker goes in before the first send; a restart mid-broadcast does not resend
    if !db::mark_version_announced(pool, version).await? {
        return Ok(None);
    }

    let recipients = db::list_all_user_ids(pool).await?;
    let body = announcement_text(version, release_notes);
    let report = broadcast(transport, &recipients, &body, None, delay).await;

    db::set_stored_bot_version(pool, version).await?;
    info!(version, "Version announcement: {}", report);

    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcement_text_with_and_without_notes() {
        assert_eq!(
            announcement_text("v1.2", Some("  ")),
            "🆕 GarageLib has been updated to v1.2."
        );
        assert!(announcement_text("v1.2", Some("Artist cards")).ends_with("\n\nArtist cards"));
    }
}
