use thiserror::Error;

/// Errors raised while loading designs or validating user input.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Canvas or design JSON could not be parsed or produced.
    #[error("invalid canvas JSON: {0}")]
    CanvasJson(#[from] serde_json::Error),

    #[error("canvas dimensions {width}x{height} are outside {min}..={max}")]
    InvalidDimensions {
        width: f64,
        height: f64,
        min: f64,
        max: f64,
    },

    #[error("unsupported file type `{0}`")]
    UnsupportedFileType(String),

    #[error("invalid color `{0}`")]
    InvalidColor(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
