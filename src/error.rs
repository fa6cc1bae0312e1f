//! Error types for wpscraper

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading criteria or scanning sites
#[derive(Debug, Error)]
pub enum Error {
    /// Criteria file does not exist
    #[error("criteria file not found: {}", .0.display())]
    CriteriaNotFound(PathBuf),

    /// Criteria file exists but could not be read
    #[error("failed to read criteria file {}", path.display())]
    CriteriaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Criteria line without a `slug; range` shape
    #[error("malformed criteria on line {line}: '{content}' (expected '<slug>; <min>[ - <max>]')")]
    MalformedCriteria { line: usize, content: String },

    /// Version string with non-integer components
    #[error("invalid version format: '{0}'")]
    InvalidVersionFormat(String),

    /// Invalid URL provided
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to create HTTP client
    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),

    /// Domain list could not be read
    #[error("failed to read domain list {}", path.display())]
    DomainList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV sink failure
    #[error("CSV output failed")]
    Csv(#[from] csv::Error),

    /// Output operation failed
    #[error("output failed: {0}")]
    OutputFailed(#[source] std::io::Error),
}
