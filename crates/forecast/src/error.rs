//! Forecast pipeline error model.

use thiserror::Error;

/// Result type used across the forecast pipeline.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// Forecast pipeline error.
///
/// Keep this focused on the pipeline's own failures (bad inputs, training,
/// artifact files). Network collaborators report their failures upstream.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// An input value failed validation (e.g. a non-numeric temperature).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A category name outside the known catalog.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// Training could not produce a usable model pair.
    #[error("training failed: {0}")]
    Training(String),

    /// Artifact file I/O failure.
    #[error("artifact io: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact (de)serialization failure.
    #[error("artifact codec: {0}")]
    Codec(#[from] serde_json::Error),
}

impl ForecastError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }
}
