//! Deepshot: a level-bounded site capturer
//!
//! This crate walks a bounded web domain breadth-first through a browser
//! session, captures every page it reaches as a stitched full-page image, an
//! HTML snapshot or a downloaded file, and keeps a resumable, deduplicated
//! record of everything it visited.

pub mod browser;
pub mod capture;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Fatal error type for a crawl
///
/// Expected per-page conditions (out-of-scope links, timeouts, capture
/// failures) never surface here; they are classified and tallied instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Checkpoint error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Transition(#[from] state::TransitionError),

    #[error("Loaded level 0 url ({expected}) does not match browser location ({actual})")]
    ResumeMismatch { expected: String, actual: String },

    #[error("Crawl interrupted")]
    Interrupted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("No registrable domain in URL: {0}")]
    MissingDomain(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{CrawlState, Decision, DedupLedger, Frontier, Node, NodeState};
pub use url::{canonicalize, registrable_domain, ScopeFilter};
