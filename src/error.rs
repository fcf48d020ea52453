//! Error taxonomy for graph ingestion and insight queries

use thiserror::Error;

/// Errors surfaced by the graph context, ingestors and the insight aggregator.
///
/// Only `Validation` carries caller-facing detail. `Unavailable` and
/// `Transport` keep their cause for server-side logging; the HTTP layer
/// replaces it with a generic message.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Connection settings are missing; raised before any connection attempt.
    #[error("graph backend is not configured: missing {0}")]
    Config(String),

    /// A required request field is missing or malformed. Never retried.
    #[error("{0}")]
    Validation(String),

    /// The backend is configured but the readiness gate could not pass.
    #[error("graph backend is unavailable")]
    Unavailable(#[source] anyhow::Error),

    /// Connectivity, timeout, constraint violation or any other engine failure.
    #[error("graph backend error")]
    Transport(#[from] anyhow::Error),
}

impl GraphError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the caller should see this as "backend not reachable".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Unavailable(_))
    }
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
