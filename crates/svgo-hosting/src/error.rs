//! Error types for svgo-hosting

use thiserror::Error;

/// Errors returned by a [`HostingApi`](crate::HostingApi) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostingError {
    /// The requested ref, commit, file or pull request does not exist
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Blob content exceeds what the hosting API accepts
    #[error("blob of {size} bytes exceeds the {limit} byte limit")]
    BlobTooLarge { size: usize, limit: usize },

    /// Non-success HTTP response
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection or protocol failure before a response was received
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body could not be interpreted
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Failure injected by the in-memory fake
    #[error("injected failure in {operation}")]
    Injected { operation: String },
}

impl HostingError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        HostingError::NotFound {
            resource: resource.into(),
        }
    }

    /// Whether this error means the resource is absent (as opposed to unreachable).
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostingError::NotFound { .. })
    }
}

impl From<reqwest::Error> for HostingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            HostingError::Decode(err.to_string())
        } else {
            HostingError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HostingError {
    fn from(err: serde_json::Error) -> Self {
        HostingError::Decode(err.to_string())
    }
}
