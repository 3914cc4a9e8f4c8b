//! Error types for metric construction, observation and rendering.

use thiserror::Error;

/// Result type alias for metric operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors that can occur while building, updating or rendering metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("summary requires at least one quantile")]
    NoQuantiles,

    #[error("invalid quantile: {0} (must be within 0 and 1, exclusive)")]
    InvalidQuantile(f64),

    #[error("invalid histogram bucket: {0}")]
    InvalidBucket(f64),

    #[error("invalid histogram value: {0}")]
    InvalidHistogramValue(f64),

    #[error("invalid summary value: {0}")]
    InvalidSummaryValue(f64),

    #[error("unexpected value format: {0}")]
    UnexpectedValueFormat(String),

    #[error("reader error: {0}")]
    Reader(#[from] anyhow::Error),
}
