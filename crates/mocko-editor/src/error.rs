use crate::export::ExportFormat;
use mocko_core::{CoreError, ObjectId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("invalid editor configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid editor configuration: {0}")]
    InvalidConfig(String),

    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    #[error("nothing is selected")]
    NothingSelected,

    #[error("{0} export requires a premium subscription")]
    PremiumRequired(ExportFormat),

    #[error("unknown export format: {0}")]
    UnknownExportFormat(String),
}

pub type EditorResult<T> = Result<T, EditorError>;
