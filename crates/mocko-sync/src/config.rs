//! Persistence configuration.

use crate::error::ApiResult;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Primary environment variable holding the backend origin.
pub const API_URL_VAR: &str = "NEXT_PUBLIC_API_URL";
/// Fallback used by older deployments.
pub const API_BASE_URL_VAR: &str = "NEXT_PUBLIC_API_BASE_URL";

const DEFAULT_API_URL: &str = "http://localhost:5000/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Backend origin; endpoints are joined onto it.
    pub api_base_url: String,
    /// Quiet period after the last modification before auto-saving.
    pub autosave_debounce_ms: u64,
    /// Refresh the session this long before it expires.
    pub refresh_margin_secs: u64,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            autosave_debounce_ms: 3_000,
            refresh_margin_secs: 120,
            request_timeout_ms: 15_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Defaults, with the API origin taken from the environment.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let mut config = Self::default();
        let origin = [API_URL_VAR, API_BASE_URL_VAR]
            .into_iter()
            .filter_map(|key| lookup(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty());
        if let Some(origin) = origin {
            config.api_base_url = parse_base_url(&origin)?.to_string();
        }
        Ok(config)
    }

    /// The validated API origin.
    pub fn base_url(&self) -> ApiResult<Url> {
        parse_base_url(&self.api_base_url)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Parse an origin so that relative joins append to its path.
pub fn parse_base_url(origin: &str) -> ApiResult<Url> {
    let mut url = Url::parse(origin)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
