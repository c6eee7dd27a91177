//! Statistics over a crawl state
//!
//! This module provides functionality for condensing a loaded or live
//! [`CrawlState`] into counts and displaying them.

use crate::state::{CrawlState, NodeState};
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of nodes in the frontier
    pub total_nodes: u64,

    /// Count of nodes by lifecycle state
    pub nodes_by_state: BTreeMap<String, u64>,

    /// Node count per level
    pub nodes_by_level: BTreeMap<u32, u64>,

    /// Nodes processed since the crawl started
    pub processed: u64,

    pub duplicates: u64,
    pub invalid: u64,
    pub out_of_scope: u64,
    pub timeouts: u64,
    pub errors: u64,
}

/// Collects statistics from a crawl state
///
/// # Arguments
///
/// * `state` - The crawl state to summarize
pub fn collect_statistics(state: &CrawlState) -> CrawlStatistics {
    let mut stats = CrawlStatistics {
        processed: state.processed_count,
        duplicates: state.ledger.duplicate_count(),
        invalid: state.counters.invalid.count(),
        out_of_scope: state.counters.out_of_scope.count(),
        timeouts: state.counters.timeout.count(),
        errors: state.counters.error.count(),
        ..CrawlStatistics::default()
    };

    for node in state.frontier.iter() {
        stats.total_nodes += 1;
        *stats.nodes_by_level.entry(node.level).or_insert(0) += 1;

        // Nodes are only ever persisted without their snapshot
        let node_state = match node.state() {
            NodeState::Expanded => NodeState::Archived,
            other => other,
        };
        *stats
            .nodes_by_state
            .entry(node_state.as_str().to_string())
            .or_insert(0) += 1;
    }

    stats
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total nodes: {}", stats.total_nodes);
    println!("  Processed: {}", stats.processed);
    println!();

    println!("Nodes by Level:");
    for (level, count) in &stats.nodes_by_level {
        println!("  {}: {}", level, count);
    }
    println!();

    println!("Nodes by State:");
    // Sort states by count (descending)
    let mut state_counts: Vec<_> = stats.nodes_by_state.iter().collect();
    state_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (state, count) in state_counts {
        let percentage = if stats.total_nodes > 0 {
            (*count as f64 / stats.total_nodes as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    println!("Classifications:");
    println!("  Duplicates: {}", stats.duplicates);
    println!("  Invalid URLs: {}", stats.invalid);
    println!("  Out of scope: {}", stats.out_of_scope);
    println!("  Timeouts: {}", stats.timeouts);
    println!("  Errors: {}", stats.errors);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Node;

    #[test]
    fn test_collect_statistics() {
        let mut state = CrawlState::seeded("https://example.com");
        if let Some(root) = state.frontier.node_mut(0, 0) {
            root.mark_processed("image");
            root.mark_expanded().unwrap();
        }
        state
            .frontier
            .push(Node::discovered(1, "https://example.com/a", "https://example.com", None, None));
        state.processed_count = 1;
        state.counters.record_timeout("https://example.com/slow");
        state.ledger.admit("https://example.com", None);

        let stats = collect_statistics(&state);
        assert_eq!(stats.total_nodes, 2);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.nodes_by_level.get(&1), Some(&1));
        assert_eq!(stats.nodes_by_state.get("archived"), Some(&1));
        assert_eq!(stats.nodes_by_state.get("pending"), Some(&1));
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.errors, 1);
    }
}
