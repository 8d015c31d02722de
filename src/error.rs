// src/error.rs

//! Unified error handling for the roundup application.

use std::fmt;

use thiserror::Error;

/// Result type alias for roundup operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Timeout, DNS failure, connection reset or non-2xx response
    #[error("Network failure for {url}: {message}")]
    Network {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Feed body is empty or not a recognisable syndication feed
    #[error("Feed unavailable: {0}")]
    FeedUnavailable(String),

    /// Container bytes do not decode
    #[error("Apparently malformed puzzle file at {link}: {message}")]
    MalformedContainer { link: String, message: String },

    /// Container decodes but the expected metadata is absent
    #[error("Puzzle metadata missing: {0}")]
    MetadataMissing(String),

    /// Every applicable strategy came back empty
    #[error("No puzzle found for {0}")]
    NoPuzzleFound(String),

    /// Mailbox search or fetch failed
    #[error("Mailbox error: {0}")]
    Mailbox(String),

    /// External puzzle scraper failed
    #[error("Scraper error: {0}")]
    Scraper(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Zip archive could not be written
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a network error for a request that failed.
    pub fn network(url: impl Into<String>, error: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }

    /// Create a malformed container error naming the source link.
    pub fn malformed(link: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedContainer {
            link: link.into(),
            message: message.to_string(),
        }
    }

    /// Create a missing metadata error.
    pub fn metadata_missing(message: impl Into<String>) -> Self {
        Self::MetadataMissing(message.into())
    }

    /// Create a feed error.
    pub fn feed(message: impl Into<String>) -> Self {
        Self::FeedUnavailable(message.into())
    }

    /// Create a mailbox error.
    pub fn mailbox(message: impl fmt::Display) -> Self {
        Self::Mailbox(message.to_string())
    }

    /// Create an external scraper error.
    pub fn scraper(message: impl fmt::Display) -> Self {
        Self::Scraper(message.to_string())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Only connection-level failures qualify; a server that answered with
    /// an error status is not retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { status: None, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_only_without_status() {
        let timeout = AppError::Network {
            url: "https://example.com".into(),
            status: None,
            message: "timed out".into(),
        };
        let not_found = AppError::Network {
            url: "https://example.com".into(),
            status: Some(404),
            message: "404 Not Found".into(),
        };

        assert!(timeout.is_transient());
        assert!(!not_found.is_transient());
        assert!(!AppError::feed("empty").is_transient());
    }

    #[test]
    fn test_malformed_names_link() {
        let err = AppError::malformed("https://example.com/a.puz", "missing header");
        assert_eq!(
            err.to_string(),
            "Apparently malformed puzzle file at https://example.com/a.puz: missing header"
        );
    }
}
