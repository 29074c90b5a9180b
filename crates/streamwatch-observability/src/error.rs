//! Error types for streamwatch-observability

use thiserror::Error;

/// Errors that can occur in observability operations
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// Metric creation, registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Encoded metrics were not valid UTF-8
    #[error("Metrics encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Subscriber installation failed
    #[error("Tracing error: {0}")]
    Tracing(String),
}

/// Result type alias for observability operations
pub type Result<T> = std::result::Result<T, ObservabilityError>;
