//! Error types for Chatlift

use std::collections::BTreeMap;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum ExtractError {
    /// URL could not be parsed at all
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// URL parses but matches no registered platform
    #[error("Unsupported platform URL: {0}")]
    UnsupportedPlatform(String),

    /// The share page returned 404: conversation deleted or never shared
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// Non-2xx response other than 404
    #[error("Fetch failed with HTTP {status} for {url}")]
    FetchFailed { url: String, status: u16 },

    /// Every extraction strategy ran and produced zero messages.
    /// This is the expected "page format changed" case.
    #[error(
        "No messages could be extracted from \"{}\" ({} strategies attempted)",
        .title.as_deref().unwrap_or("untitled page"),
        .attempted.len()
    )]
    NoMessagesFound {
        /// Best-effort page title scraped from meta tags
        title: Option<String>,
        /// Strategy names in the order they ran
        attempted: Vec<String>,
        /// Per-strategy failure reason
        errors: BTreeMap<String, String>,
    },

    /// Transport-level error from the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;
