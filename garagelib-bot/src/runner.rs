//! Long-polling update loop
//!
//! Fetches update batches, advances the offset past every update seen
//! (handled or not) and hands each one to the per-user queues. Flood
//! control pauses for the requested time; other failures back off
//! exponentially up to [`MAX_BACKOFF`].

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dispatch::UserQueues;
use crate::error::TransportError;
use crate::transport::types::Update;
use crate::transport::TelegramClient;

pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Where updates come from
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, TransportError>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
        self.get_updates(offset, timeout_secs).await
    }
}

/// Poll until `shutdown` flips to true
pub async fn run_polling(
    source: &dyn UpdateSource,
    queues: &UserQueues,
    poll_timeout_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut offset: Option<i64> = None;
    let mut backoff = INITIAL_BACKOFF;
    info!(poll_timeout_secs, "Polling for updates");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let fetched = tokio::select! {
            result = source.fetch(offset, poll_timeout_secs) => result,
            _ = shutdown.changed() => break,
        };

        let pause = match fetched {
            Ok(updates) => {
                backoff = INITIAL_BACKOFF;
                for update in updates {
                    offset = Some(update.update_id + 1);
                    match update.into_incoming() {
                        Some(incoming) => queues.submit(incoming).await,
                        None => debug!("Ignoring unsupported update"),
                    }
                }
                continue;
            }
            Err(TransportError::RetryAfter(secs)) => {
                warn!(retry_after = secs, "Rate limited while polling");
                Duration::from_secs(secs)
            }
            Err(e) => {
                warn!(error = %e, backoff_secs = backoff.as_secs(), "Polling failed, backing off");
                let pause = backoff;
                backoff = (backoff * 2).min(MAX_BACKOFF);
                pause
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = shutdown.changed() => break,
        }
    }

    info!("Polling stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Serves scripted batches, then signals shutdown
    struct ScriptedSource {
        batches: Mutex<Vec<Result<Vec<Update>, TransportError>>>,
        offsets: Mutex<Vec<Option<i64>>>,
        shutdown: watch::Sender<bool>,
    }

    #[async_trait]
    impl UpdateSource for ScriptedSource {
        async fn fetch(&self, offset: Option<i64>, _timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
            self.offsets.lock().await.push(offset);
            let mut batches = self.batches.lock().await;
            if batches.is_empty() {
                let _ = self.shutdown.send(true);
                return Ok(Vec::new());
            }
            batches.remove(0)
        }
    }

    fn update(update_id: i64) -> Update {
        serde_json::from_value(serde_json::json!({ "update_id": update_id })).unwrap()
    }

    #[tokio::test]
    async fn test_offset_advances_past_every_update() {
        use crate::dispatch::Dispatcher;
        use crate::services::{CatalogBrowser, PublishPipeline};
        use crate::transport::RecordingTransport;
        use crate::workflow::{SessionStore, UploadWorkflow};
        use garagelib_common::db::init_memory_database;

        let pool = init_memory_database().await.unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let pipeline = PublishPipeline::new(pool.clone(), transport.clone(), None, Duration::ZERO);
        let workflow = UploadWorkflow::new(pool.clone(), SessionStore::new(), pipeline);
        let browser = CatalogBrowser::new(pool, transport.clone(), None, "v1.1");
        let queues = UserQueues::new(Arc::new(Dispatcher::new(workflow, browser, transport)));

        let (tx, rx) = watch::channel(false);
        let source = ScriptedSource {
            batches: Mutex::new(vec![
                Ok(vec![update(10), update(11)]),
                Err(TransportError::Network("timeout".to_string())),
                Ok(vec![update(12)]),
            ]),
            offsets: Mutex::new(Vec::new()),
            shutdown: tx,
        };

        run_polling(&source, &queues, 30, rx).await;

        let offsets = source.offsets.lock().await.clone();
        assert_eq!(offsets, vec![None, Some(12), Some(12), Some(13)]);
    }
}
