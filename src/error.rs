//! Error types for result aggregation.
//!
//! All errors use stable string messages suitable for display and
//! programmatic handling. Query text never appears in error messages.

/// Errors that can occur while ingesting or aggregating engine results.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// A result URL could not be decomposed into scheme/host/path/query.
    ///
    /// Fatal for the batch being ingested: no merge key can be derived.
    #[error("invalid result URL {url:?}: {reason}")]
    InvalidUrl {
        /// The offending URL, after byte decoding.
        url: String,
        /// Why the parser rejected it.
        reason: String,
    },

    /// A raw engine item could not be decoded into a known shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid aggregation configuration.
    #[error("config error: {0}")]
    Config(String),

    /// An engine source failed to produce its batch.
    #[error("engine {engine} failed: {message}")]
    Engine {
        /// Identifier of the failing engine.
        engine: String,
        /// Failure description reported by the engine.
        message: String,
    },

    /// Every queried engine source failed or timed out.
    #[error("all engines failed: {0}")]
    AllEnginesFailed(String),

    /// An engine source did not answer before its deadline.
    #[error("engine timed out: {0}")]
    Timeout(String),
}

impl From<serde_json::Error> for AggregateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Convenience type alias for aggregation results.
pub type Result<T> = std::result::Result<T, AggregateError>;
