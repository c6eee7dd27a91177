//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::state::CrawlState;
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed row {line} in {table}: {reason}")]
    Malformed {
        table: &'static str,
        line: u64,
        reason: String,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for checkpoint backend implementations
///
/// A store exclusively owns its persisted form. Callers hand it a complete
/// [`CrawlState`] to save and receive one back on load.
pub trait CheckpointStore {
    /// Persists the whole crawl state
    ///
    /// A crash part-way through may leave individual tables stale, never
    /// half-written.
    fn save(&mut self, state: &CrawlState) -> StorageResult<()>;

    /// Loads the persisted crawl state
    ///
    /// # Returns
    ///
    /// * `Ok(Some(state))` - A checkpoint exists and was parsed
    /// * `Ok(None)` - Nothing has been saved yet
    /// * `Err(StorageError)` - A table exists but cannot be read
    fn load(&self) -> StorageResult<Option<CrawlState>>;
}
