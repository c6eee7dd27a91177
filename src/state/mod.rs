//! State module for tracking crawl progress
//!
//! This module holds everything a crawl knows about itself: the per-level
//! frontier of nodes, the deduplication ledger, and the classification
//! tallies. The three are bundled in a single [`CrawlState`] value that the
//! traversal controller owns and threads through each step.
//!
//! # Components
//!
//! - `Node`: One discovered page and its lifecycle flags
//! - `Frontier`: Per-level ordered queues of nodes
//! - `DedupLedger`: Admission decisions and revisit counters
//! - `Counters`: Invalid, out-of-scope, timeout and error tallies

mod counters;
mod frontier;
mod ledger;
mod node;

// Re-export main types
pub use counters::{Counters, Tally};
pub use frontier::Frontier;
pub use ledger::{Decision, DedupLedger, LedgerEntry};
pub use node::{ContentClass, Node, NodeState, TransitionError};

/// Complete in-memory state of a crawl
///
/// This is what the checkpoint store saves and loads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlState {
    pub frontier: Frontier,
    pub ledger: DedupLedger,
    pub counters: Counters,

    /// Nodes processed since the crawl started, used for artifact sequence
    /// numbers and checkpoint cadence
    pub processed_count: u64,
}

impl CrawlState {
    /// Creates a fresh state seeded with the root node
    pub fn seeded(start_url: &str) -> Self {
        let mut state = Self::default();
        state.ledger.record(start_url, None);
        state.frontier.push(Node::root(start_url));
        state
    }
}
