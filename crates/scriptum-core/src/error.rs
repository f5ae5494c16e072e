//! Error types shared across the core library.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Operation needs an active session and none is present. Raised before
    /// any request is sent.
    #[error("Authentication required")]
    AuthRequired,

    /// The remote service answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// No response received (DNS, connect, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    /// Whether this error is a 401 rejection from the remote service.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }
}
