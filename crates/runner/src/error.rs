//! Runner error model.

use thiserror::Error;

use stockcast_forecast::ForecastError;

/// Errors surfaced by the periodic forecast runner and its collaborators.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A snapshot or condition source failed (storage/network collaborator).
    #[error("source unavailable: {0}")]
    Source(String),

    /// Rejected configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Config file I/O failure.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),

    /// Config (de)serialization failure.
    #[error("config codec: {0}")]
    Codec(#[from] serde_json::Error),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl RunnerError {
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
