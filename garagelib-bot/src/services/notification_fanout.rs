//! Sequential broadcast with per-recipient failure isolation
//!
//! One failed recipient (blocked bot, unknown chat, network error, flood
//! control) is recorded and skipped; it never stops the batch. There are no
//! retries.

use garagelib_common::db::UserId;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use crate::transport::{ParseMode, Transport};

/// Default pause between two sends
pub const DEFAULT_NOTIFY_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub attempted: usize,
    /// Recipients that did not get the message, in send order
    pub failed: Vec<UserId>,
}

impl FanoutReport {
    pub fn delivered(&self) -> usize {
        self.attempted - self.failed.len()
    }
}

impl fmt::Display for FanoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} delivered", self.delivered(), self.attempted)
    }
}

/// Send `body` to every recipient in order, waiting `delay` between sends
pub async fn broadcast(
    transport: &dyn Transport,
    recipients: &[UserId],
    body: &str,
    parse_mode: Option<ParseMode>,
    delay: Duration,
) -> FanoutReport {
    let mut report = FanoutReport::default();

    for (index, &recipient) in recipients.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        report.attempted += 1;
        if let Err(e) = transport.send_text(recipient, body, None, parse_mode).await {
            debug!(recipient, error = %e, "Notification not delivered");
            report.failed.push(recipient);
        }
    }

    info!(
        attempted = report.attempted,
        failed = report.failed.len(),
        "Broadcast finished: {}",
        report
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingTransport;

    #[tokio::test]
    async fn test_empty_recipient_list() {
        let transport = RecordingTransport::new();
        let report = broadcast(&transport, &[], "hi", None, Duration::ZERO).await;
        assert_eq!(report, FanoutReport::default());
        assert_eq!(report.to_string(), "0/0 delivered");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_sends() {
        let transport = RecordingTransport::new();
        let started = tokio::time::Instant::now();

        broadcast(&transport, &[1, 2, 3], "hi", None, Duration::from_millis(50)).await;

        // Two gaps for three recipients
        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
