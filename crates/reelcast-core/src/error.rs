//! Error types for Reelcast Core

use thiserror::Error;

/// Result type alias for session and client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reelcast error types
///
/// Playback faults reported by a streaming engine are not errors: they are
/// classified by [`crate::fault`] and surface as session status instead.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Invalid content reference: {0}")]
    InvalidContentRef(String),

    // Manifest errors
    #[error("Failed to fetch manifest: {0}")]
    ManifestFetch(String),

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(String),

    // Catalog errors
    #[error("{0}")]
    Catalog(String),

    #[error("{0}")]
    Upload(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid content reference error
    pub fn invalid_content(msg: impl Into<String>) -> Self {
        Error::InvalidContentRef(msg.into())
    }

    /// Returns the error code for logs and machine-readable output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidContentRef(_) => "INVALID_CONTENT_REF",
            Error::ManifestFetch(_) => "MANIFEST_FETCH",
            Error::ManifestParse(_) => "MANIFEST_PARSE",
            Error::Catalog(_) => "CATALOG",
            Error::Upload(_) => "UPLOAD",
            Error::Network(_) => "NETWORK",
            Error::UrlParse(_) => "URL_PARSE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Io(_) => "IO",
        }
    }

    /// Short human-readable message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidContentRef(_) => "Invalid video selection".to_string(),
            Error::ManifestFetch(_) | Error::ManifestParse(_) => "Failed to load video".to_string(),
            Error::Catalog(msg) | Error::Upload(msg) => msg.clone(),
            Error::Network(_) => "Network error. Please check your connection.".to_string(),
            Error::UrlParse(_) | Error::InvalidConfig(_) => "Player is misconfigured".to_string(),
            Error::Io(e) => format!("File error: {e}"),
        }
    }
}
