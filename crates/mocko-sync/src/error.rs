use mocko_core::CoreError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: timeout, DNS, connection refused, offline.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The session token is missing, expired or rejected (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    #[error("server responded {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("session refresh failed: {0}")]
    Refresh(String),

    #[error("auto-save worker has stopped")]
    WorkerStopped,
}

impl ApiError {
    /// Network failures, 5xx responses and rate limiting are worth
    /// another attempt; everything else fails the same way twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(err) => !err.is_decode() && !err.is_builder(),
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            message: String::new(),
        }
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(422).is_retryable());
    }

    #[test]
    fn auth_is_not_retried() {
        assert!(ApiError::Unauthorized.is_auth());
        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(!ApiError::Refresh("expired".into()).is_auth());
    }
}
