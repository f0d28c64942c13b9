//! Error types for ui5-version-feed

use thiserror::Error;

/// Errors that can occur while fetching the version overview
#[derive(Error, Debug)]
pub enum FeedError {
    /// Transport level failure (DNS, TLS, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Server answered with a non-success status
    #[error("version overview request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// Body was not a valid version overview document
    #[error("invalid version overview document: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration could not be used to build a client
    #[error("invalid feed configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Http(err.to_string())
    }
}
