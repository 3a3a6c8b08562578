//! Client-side persistence for the Mocko editor: the REST client, debounced
//! auto-save and session token refresh, all on tokio.

pub mod api;
pub mod autosave;
pub mod config;
pub mod error;
pub mod retry;
pub mod session;

pub use api::{ApiClient, DesignStore, Subscription};
pub use autosave::{AutoSaveHandle, AutoSaver, SaveStatus};
pub use config::SyncConfig;
pub use error::{ApiError, ApiResult};
pub use retry::RetryPolicy;
pub use session::{SessionProvider, SessionState, SessionToken, TokenManager};
