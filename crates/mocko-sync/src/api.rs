//! REST client for the Mocko backend.
//!
//! Endpoints:
//! - `GET    /v1/designs`        list the user's designs
//! - `GET    /v1/designs/{id}`   load one design
//! - `POST   /v1/designs`        create or update (by `designId`)
//! - `DELETE /v1/designs/{id}`   delete
//! - `GET    /v1/subscription`   read-only subscription status
//!
//! Responses are accepted either bare or wrapped as `{ "data": ... }`.

use crate::config::SyncConfig;
use crate::error::{ApiError, ApiResult};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use mocko_core::{DesignRecord, SaveDesignRequest};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use url::Url;

/// Storage backend for designs. The auto-save worker only talks to this.
#[async_trait]
pub trait DesignStore: Send + Sync {
    async fn list_designs(&self) -> ApiResult<Vec<DesignRecord>>;

    async fn get_design(&self, id: &str) -> ApiResult<DesignRecord>;

    /// Create (no `design_id`) or update a design; returns the stored record.
    async fn save_design(&self, request: &SaveDesignRequest) -> ApiResult<DesignRecord>;

    async fn delete_design(&self, id: &str) -> ApiResult<()>;
}

/// Subscription status, used for export gating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subscription {
    pub is_premium: bool,
    pub plan: Option<String>,
    pub status: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Body<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Body<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(value) => value,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

/// HTTP implementation of [`DesignStore`]. Cheap to clone; clones share
/// the connection pool and the bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    retry: RetryPolicy,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: &SyncConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base: config.base_url()?,
            retry: config.retry,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Replace the bearer token sent with every request.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub async fn subscription(&self) -> ApiResult<Subscription> {
        let this = self;
        self.retry
            .run("GET /v1/subscription", move || async move {
                let res = this.request(Method::GET, "v1/subscription")?.send().await?;
                decode(res).await
            })
            .await
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = self.base.join(path)?;
        let mut builder = self.http.request(method, url);
        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }
}

/// Map status codes to errors, then decode the (possibly wrapped) body.
async fn decode<T: DeserializeOwned>(res: Response) -> ApiResult<T> {
    let res = check_status(res).await?;
    let bytes = res.bytes().await?;
    let body: Body<T> = serde_json::from_slice(&bytes)?;
    Ok(body.into_inner())
}

async fn check_status(res: Response) -> ApiResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    let text = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);
    Err(ApiError::Status { status, message })
}

#[async_trait]
impl DesignStore for ApiClient {
    async fn list_designs(&self) -> ApiResult<Vec<DesignRecord>> {
        let this = self;
        self.retry
            .run("GET /v1/designs", move || async move {
                let res = this.request(Method::GET, "v1/designs")?.send().await?;
                decode(res).await
            })
            .await
    }

    async fn get_design(&self, id: &str) -> ApiResult<DesignRecord> {
        let (this, path) = (self, &format!("v1/designs/{id}"));
        self.retry
            .run("GET /v1/designs/{id}", move || async move {
                let res = this.request(Method::GET, path)?.send().await?;
                decode(res).await
            })
            .await
    }

    async fn save_design(&self, request: &SaveDesignRequest) -> ApiResult<DesignRecord> {
        debug!(
            "saving design {:?} ({} bytes)",
            request.design_id,
            request.canvas_data.len()
        );
        let this = self;
        self.retry
            .run("POST /v1/designs", move || async move {
                let res = this
                    .request(Method::POST, "v1/designs")?
                    .json(request)
                    .send()
                    .await?;
                decode(res).await
            })
            .await
    }

    async fn delete_design(&self, id: &str) -> ApiResult<()> {
        let (this, path) = (self, &format!("v1/designs/{id}"));
        self.retry
            .run("DELETE /v1/designs/{id}", move || async move {
                let res = this.request(Method::DELETE, path)?.send().await?;
                check_status(res).await.map(drop)
            })
            .await
    }
}
