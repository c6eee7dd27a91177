//! Output module for crawl summaries
//!
//! This module handles:
//! - Logging the results summary when a crawl stops
//! - Condensing a checkpoint into statistics for display

mod results;
pub mod stats;

pub use results::print_results;
pub use stats::{collect_statistics, print_statistics, CrawlStatistics};

use crate::storage::CheckpointStore;
use crate::Result;

/// Loads statistics from a checkpoint store
///
/// # Returns
///
/// * `Ok(Some(CrawlStatistics))` - A checkpoint exists
/// * `Ok(None)` - Nothing has been saved yet
/// * `Err(CrawlError)` - The checkpoint cannot be read
pub fn load_statistics(store: &dyn CheckpointStore) -> Result<Option<CrawlStatistics>> {
    Ok(store.load()?.as_ref().map(collect_statistics))
}
