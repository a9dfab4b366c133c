//! Custom error types for linkspam

use thiserror::Error;

/// Main error type for linkspam operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("API error ({code}): {info}")]
    Api { code: String, info: String },

    #[error("Unexpected API response: {0}")]
    Response(String),

    #[error("Run page {0} is not set to True, refusing to run")]
    RunBlocked(String),

    #[error("Invalid site: {0}")]
    InvalidSite(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Failed to lock {0}")]
    Lock(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Errors worth retrying: network failures and HTTP error statuses.
    /// A body that fails to decode will not decode any better next time.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_decode(),
            Error::HttpStatus { .. } => true,
            _ => false,
        }
    }
}

/// Result type alias for linkspam
pub type Result<T> = std::result::Result<T, Error>;
