//! Storage module for persisting crawl checkpoints
//!
//! This module handles saving and restoring the crawl state, including:
//! - The per-level frontier of nodes and their capture flags
//! - The deduplication ledger with its revisit counters
//! - The invalid, out-of-scope, timeout and error tallies
//!
//! Tables are plain CSV so an operator can inspect (or hand-edit) a stalled
//! crawl before resuming it.

mod csv_store;
mod schema;
mod traits;

pub use csv_store::CsvCheckpointStore;
pub use schema::{Table, DUPS, ERRORS, INVALIDS, ITEMS, OUT_OF_SCOPE, TIMEOUTS};
pub use traits::{CheckpointStore, StorageError, StorageResult};

use std::path::Path;

/// Opens the checkpoint store for an output directory
pub fn open_checkpoint(output_dir: &Path) -> CsvCheckpointStore {
    CsvCheckpointStore::new(output_dir)
}
