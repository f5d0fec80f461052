//! Error types for the ModelFetch core

use thiserror::Error;

/// Errors that can occur while resolving or streaming a download.
///
/// Every variant is terminal for the download that produced it; nothing is
/// retried automatically.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Expected a redirect from {url}, got status {status}")]
    NoRedirect { url: String, status: u16 },

    #[error("Malformed redirect: {0}")]
    MalformedRedirect(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("API error: {0}")]
    Api(String),
}
