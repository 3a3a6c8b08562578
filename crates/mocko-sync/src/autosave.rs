//! Debounced auto-save.
//!
//! A single worker task owns the receiving end of a command channel and is
//! the only writer to the [`DesignStore`]. The editor side holds a cheap
//! [`AutoSaveHandle`]:
//!
//! - every modification replaces the pending request and restarts the quiet
//!   period;
//! - when the quiet period elapses the latest request is saved;
//! - [`AutoSaveHandle::flush`] saves whatever is pending right away;
//! - dropping every handle flushes once more and stops the worker.
//!
//! Saves run one at a time. Commands that arrive during a save wait in the
//! channel and are handled once it completes.

use crate::api::DesignStore;
use crate::config::SyncConfig;
use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use mocko_core::{DesignRecord, SaveDesignRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// What the auto-saver is doing, for the "Saving… / Saved" indicator.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SaveStatus {
    #[default]
    Idle,
    /// Modified, waiting for the quiet period to elapse.
    Pending,
    Saving,
    Saved {
        at: DateTime<Utc>,
        design_id: String,
    },
    Failed(String),
}

impl SaveStatus {
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Pending | Self::Saving | Self::Failed(_))
    }
}

type FlushReply = oneshot::Sender<ApiResult<Option<DesignRecord>>>;

enum Command {
    Modified(SaveDesignRequest),
    Flush(FlushReply),
}

/// Builder for the auto-save worker.
pub struct AutoSaver {
    store: Arc<dyn DesignStore>,
    debounce: Duration,
    design_id: Option<String>,
    on_unauthorized: Option<Arc<Notify>>,
}

impl AutoSaver {
    pub fn new(store: Arc<dyn DesignStore>, config: &SyncConfig) -> Self {
        Self {
            store,
            debounce: config.autosave_debounce(),
            design_id: None,
            on_unauthorized: None,
        }
    }

    /// Continue saving into an existing design instead of creating one.
    pub fn design_id(mut self, id: impl Into<String>) -> Self {
        self.design_id = Some(id.into());
        self
    }

    /// Notified whenever the store rejects the session, so a token refresh
    /// can start without waiting for the scheduled one.
    pub fn on_unauthorized(mut self, trigger: Arc<Notify>) -> Self {
        self.on_unauthorized = Some(trigger);
        self
    }

    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(self) -> (AutoSaveHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);
        let worker = Worker {
            store: self.store,
            debounce: self.debounce,
            design_id: self.design_id,
            on_unauthorized: self.on_unauthorized,
            status: status_tx,
            pending: None,
        };
        let task = tokio::spawn(worker.run(rx));
        let handle = AutoSaveHandle {
            tx,
            status: status_rx,
        };
        (handle, task)
    }
}

/// Editor-side handle to the auto-save worker.
#[derive(Debug, Clone)]
pub struct AutoSaveHandle {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
}

impl AutoSaveHandle {
    /// Report a modification. The request replaces any pending one.
    pub fn modified(&self, request: SaveDesignRequest) -> ApiResult<()> {
        self.tx
            .send(Command::Modified(request))
            .map_err(|_| ApiError::WorkerStopped)
    }

    /// Save pending changes now. Resolves to `None` when nothing was pending.
    pub async fn flush(&self) -> ApiResult<Option<DesignRecord>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply))
            .map_err(|_| ApiError::WorkerStopped)?;
        rx.await.map_err(|_| ApiError::WorkerStopped)?
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    /// A receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modified(req) => f.debug_tuple("Modified").field(&req.design_id).finish(),
            Self::Flush(_) => f.write_str("Flush"),
        }
    }
}

struct Worker {
    store: Arc<dyn DesignStore>,
    debounce: Duration,
    design_id: Option<String>,
    on_unauthorized: Option<Arc<Notify>>,
    status: watch::Sender<SaveStatus>,
    pending: Option<SaveDesignRequest>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        let mut deadline: Option<Instant> = None;
        loop {
            let command = match deadline {
                Some(at) => tokio::select! {
                    command = rx.recv() => command,
                    _ = sleep_until(at) => {
                        deadline = None;
                        // Failures are published on the status channel.
                        let _ = self.save_pending().await;
                        continue;
                    }
                },
                None => rx.recv().await,
            };

            match command {
                Some(Command::Modified(request)) => {
                    self.pending = Some(request);
                    deadline = Some(Instant::now() + self.debounce);
                    self.status.send_replace(SaveStatus::Pending);
                }
                Some(Command::Flush(reply)) => {
                    deadline = None;
                    let result = self.save_pending().await;
                    let _ = reply.send(result);
                }
                None => {
                    if self.pending.is_some() {
                        let _ = self.save_pending().await;
                    }
                    debug!("auto-save worker stopped");
                    return;
                }
            }
        }
    }

    async fn save_pending(&mut self) -> ApiResult<Option<DesignRecord>> {
        let Some(mut request) = self.pending.take() else {
            return Ok(None);
        };
        if request.design_id.is_none() {
            request.design_id = self.design_id.clone();
        }

        self.status.send_replace(SaveStatus::Saving);
        match self.store.save_design(&request).await {
            Ok(record) => {
                info!("auto-saved design {}", record.id);
                self.design_id = Some(record.id.clone());
                self.status.send_replace(SaveStatus::Saved {
                    at: Utc::now(),
                    design_id: record.id.clone(),
                });
                Ok(Some(record))
            }
            Err(err) => {
                error!("auto-save failed: {err}");
                if let (true, Some(trigger)) = (err.is_auth(), &self.on_unauthorized) {
                    trigger.notify_one();
                }
                self.status.send_replace(SaveStatus::Failed(err.to_string()));
                // Keep the request so the next flush or modification retries it.
                self.pending = Some(request);
                Err(err)
            }
        }
    }
}
