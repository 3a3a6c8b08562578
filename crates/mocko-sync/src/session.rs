//! Session token refresh.
//!
//! [`TokenManager`] keeps the access token fresh: it sleeps until
//! `refresh_margin` before expiry (or until poked through its trigger, e.g.
//! after a 401), then asks the [`SessionProvider`] for a new token. Failed
//! refreshes back off per the retry policy; once every attempt has failed
//! the manager flushes the auto-saver, signs the user out and stops.

use crate::api::ApiClient;
use crate::autosave::AutoSaveHandle;
use crate::config::SyncConfig;
use crate::error::{ApiError, ApiResult};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// How long to wait, from `now`, before refreshing this token.
    pub fn refresh_in(&self, now: DateTime<Utc>, margin: Duration) -> Duration {
        let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::zero());
        (self.expires_at - margin - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// The authentication provider behind the session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn refresh(&self) -> ApiResult<SessionToken>;

    async fn sign_out(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Active(SessionToken),
    SignedOut,
}

impl SessionState {
    pub fn token(&self) -> Option<&SessionToken> {
        match self {
            Self::Active(token) => Some(token),
            Self::SignedOut => None,
        }
    }
}

pub struct TokenManager {
    provider: Arc<dyn SessionProvider>,
    margin: Duration,
    retry: RetryPolicy,
    trigger: Arc<Notify>,
    client: Option<ApiClient>,
    autosave: Option<AutoSaveHandle>,
}

impl TokenManager {
    pub fn new(provider: Arc<dyn SessionProvider>, config: &SyncConfig) -> Self {
        Self {
            provider,
            margin: config.refresh_margin(),
            retry: config.retry,
            trigger: Arc::new(Notify::new()),
            client: None,
            autosave: None,
        }
    }

    /// Keep this client's bearer token in step with the session.
    pub fn with_client(mut self, client: ApiClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Flush this auto-saver before a forced sign-out.
    pub fn with_autosave(mut self, handle: AutoSaveHandle) -> Self {
        self.autosave = Some(handle);
        self
    }

    /// Notifying this starts a refresh immediately.
    pub fn trigger(&self) -> Arc<Notify> {
        Arc::clone(&self.trigger)
    }

    pub fn spawn(self, initial: SessionToken) -> (watch::Receiver<SessionState>, JoinHandle<()>) {
        let (state_tx, state_rx) = watch::channel(SessionState::Active(initial.clone()));
        let task = tokio::spawn(self.run(initial, state_tx));
        (state_rx, task)
    }

    async fn run(self, initial: SessionToken, state: watch::Sender<SessionState>) {
        let mut token = initial;
        self.install(Some(&token));
        loop {
            let wait = token.refresh_in(Utc::now(), self.margin);
            debug!("next session refresh in {wait:?}");
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.trigger.notified() => debug!("session refresh requested"),
            }

            match self.refresh().await {
                Ok(next) => {
                    info!("session refreshed, expires {}", next.expires_at);
                    self.install(Some(&next));
                    token = next;
                    state.send_replace(SessionState::Active(token.clone()));
                }
                Err(err) => {
                    error!("{err}; signing out");
                    self.sign_out().await;
                    state.send_replace(SessionState::SignedOut);
                    return;
                }
            }
        }
    }

    async fn refresh(&self) -> ApiResult<SessionToken> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last = String::new();
        for attempt in 1..=attempts {
            match self.provider.refresh().await {
                Ok(token) => return Ok(token),
                Err(err) => {
                    warn!("session refresh failed (attempt {attempt}/{attempts}): {err}");
                    last = err.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    }
                }
            }
        }
        Err(ApiError::Refresh(last))
    }

    async fn sign_out(&self) {
        if let Some(autosave) = &self.autosave {
            match autosave.flush().await {
                Ok(Some(record)) => info!("saved design {} before sign-out", record.id),
                Ok(None) => {}
                Err(err) => warn!("final auto-save failed: {err}"),
            }
        }
        self.install(None);
        self.provider.sign_out().await;
    }

    fn install(&self, token: Option<&SessionToken>) {
        if let Some(client) = &self.client {
            client.set_token(token.map(|t| t.access_token.clone()));
        }
    }
}
