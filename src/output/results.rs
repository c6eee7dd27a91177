//! End-of-crawl results summary
//!
//! Logged whenever a crawl stops, whatever the reason, so the operator can
//! see what needs manual follow-up (timeouts, errors) without opening the
//! checkpoint tables.

use crate::state::{CrawlState, Tally};

/// Logs the processed count and every tally with its per-URL breakdown
///
/// Duplicates are listed only when their revisit count is non-zero.
pub fn print_results(state: &CrawlState) {
    tracing::info!("Processed count: {}", state.processed_count);

    tracing::info!("Duplicate count: {}", state.ledger.duplicate_count());
    for (url, trigger, entry) in state.ledger.iter() {
        if entry.revisit_count > 0 {
            match trigger {
                Some(trigger) => tracing::info!("  {} [{}]: {}", url, trigger, entry.revisit_count),
                None => tracing::info!("  {}: {}", url, entry.revisit_count),
            }
        }
    }

    log_tally("Invalid URL", &state.counters.invalid);
    log_tally("Out-of-scope URL", &state.counters.out_of_scope);
    log_tally("Timeout", &state.counters.timeout);
    log_tally("Error", &state.counters.error);
}

fn log_tally(name: &str, tally: &Tally) {
    tracing::info!("{} count: {}", name, tally.count());
    for (url, count) in tally.iter() {
        tracing::info!("  {}: {}", url, count);
    }
}
