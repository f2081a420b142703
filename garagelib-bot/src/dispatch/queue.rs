//! Per-user turn queues
//!
//! Each user with pending updates gets one worker task fed by an unbounded
//! channel, so a user's turns run strictly in arrival order while different
//! users proceed concurrently. A worker retires after sitting idle; the
//! retire check and every enqueue happen under the same lock, so an update
//! is never left in a channel nobody reads.

use garagelib_common::db::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::Dispatcher;
use crate::transport::Incoming;

/// Idle time after which a user's worker exits
pub const WORKER_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

struct Worker {
    tx: mpsc::UnboundedSender<Incoming>,
    handle: JoinHandle<()>,
}

type Workers = Arc<Mutex<HashMap<UserId, Worker>>>;

pub struct UserQueues {
    dispatcher: Arc<Dispatcher>,
    workers: Workers,
    idle_timeout: Duration,
}

impl UserQueues {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self::with_idle_timeout(dispatcher, WORKER_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(dispatcher: Arc<Dispatcher>, idle_timeout: Duration) -> Self {
        Self {
            dispatcher,
            workers: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Queue a turn behind the user's earlier turns
    pub async fn submit(&self, incoming: Incoming) {
        let user_id = incoming.sender().id;
        let mut workers = self.workers.lock().await;

        let incoming = match workers.get(&user_id) {
            Some(worker) => match worker.tx.send(incoming) {
                Ok(()) => return,
                // Worker gone without deregistering (panicked turn)
                Err(mpsc::error::SendError(incoming)) => incoming,
            },
            None => incoming,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(incoming).is_err() {
            return;
        }
        let handle = tokio::spawn(run_worker(
            user_id,
            rx,
            self.dispatcher.clone(),
            self.workers.clone(),
            self.idle_timeout,
        ));
        workers.insert(user_id, Worker { tx, handle });
        debug!(user_id, "Worker started");
    }

    pub async fn active_workers(&self) -> usize {
        self.workers.lock().await.len()
    }

    /// Stop accepting turns and wait for queued ones to finish
    pub async fn close(&self) {
        let workers: Vec<(UserId, Worker)> = self.workers.lock().await.drain().collect();
        for (user_id, worker) in workers {
            drop(worker.tx);
            if let Err(e) = worker.handle.await {
                warn!(user_id, error = %e, "Worker ended abnormally");
            }
        }
    }
}

async fn run_worker(
    user_id: UserId,
    mut rx: mpsc::UnboundedReceiver<Incoming>,
    dispatcher: Arc<Dispatcher>,
    workers: Workers,
    idle_timeout: Duration,
) {
    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(incoming)) => dispatcher.handle(incoming).await,
            // Closed by `close`
            Ok(None) => break,
            Err(_) => {
                let mut registered = workers.lock().await;
                match rx.try_recv() {
                    Ok(incoming) => {
                        drop(registered);
                        dispatcher.handle(incoming).await;
                    }
                    Err(_) => {
                        registered.remove(&user_id);
                        debug!(user_id, "Worker retired");
                        break;
                    }
                }
            }
        }
    }
}
