//! Error types for the web search library.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Navigation target failed the URL well-formedness check.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Proxy value is not a well-formed URL.
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),

    /// No HTTP response was obtained at all.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// A response was obtained but its status was not 200.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Unknown filter dimension token.
    #[error("Unsupported filter '{0}'")]
    UnsupportedFilter(String),

    /// Unknown selector role.
    #[error("Unsupported selector role '{0}'")]
    UnsupportedRole(String),

    /// Per-record enrichment failed.
    #[error("Enrichment of {url} failed: {reason}")]
    Enrichment { url: String, reason: String },

    /// Article extraction produced nothing usable.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Browser automation error.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Failed to parse response or selector.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
