use serde::Serialize;
use thiserror::Error;

/// Failure of a backend round trip. Every variant is recoverable: the caller
/// keeps its last-known-good graph and reports the error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncError {
    /// The request never completed.
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The request completed with a non-success status.
    #[error("{endpoint} answered with HTTP {status}")]
    Rejected { endpoint: String, status: u16 },

    /// The body was not the JSON shape the endpoint promises.
    #[error("malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// The endpoint could not be joined onto the backend URL.
    #[error("cannot build url for {endpoint}: {message}")]
    InvalidUrl { endpoint: String, message: String },

    /// The request body could not be serialized.
    #[error("cannot encode request for {endpoint}: {message}")]
    Encode { endpoint: String, message: String },
}

impl SyncError {
    /// Short machine-readable name, mirrored in the render snapshot.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Transport { .. } => "transport",
            SyncError::Rejected { .. } => "rejected",
            SyncError::MalformedResponse { .. } => "malformed_response",
            SyncError::InvalidUrl { .. } => "invalid_url",
            SyncError::Encode { .. } => "encode",
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            SyncError::Transport { endpoint, .. }
            | SyncError::Rejected { endpoint, .. }
            | SyncError::MalformedResponse { endpoint, .. }
            | SyncError::InvalidUrl { endpoint, .. }
            | SyncError::Encode { endpoint, .. } => endpoint,
        }
    }
}
