use super::node::Node;
use std::collections::BTreeMap;

/// Per-level work queues
///
/// Insertion order within a level is the processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    levels: BTreeMap<u32, Vec<Node>>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node to the queue for its own level
    pub fn push(&mut self, node: Node) {
        self.levels.entry(node.level).or_default().push(node);
    }

    pub fn level(&self, level: u32) -> &[Node] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn level_len(&self, level: u32) -> usize {
        self.levels.get(&level).map_or(0, Vec::len)
    }

    pub fn node(&self, level: u32, index: usize) -> Option<&Node> {
        self.levels.get(&level).and_then(|nodes| nodes.get(index))
    }

    pub fn node_mut(&mut self, level: u32, index: usize) -> Option<&mut Node> {
        self.levels.get_mut(&level).and_then(|nodes| nodes.get_mut(index))
    }

    /// The level-0 node, if any
    pub fn root(&self) -> Option<&Node> {
        self.node(0, 0)
    }

    pub fn max_level(&self) -> Option<u32> {
        self.levels.keys().next_back().copied()
    }

    /// Iterates all nodes, level by level, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.levels.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.levels.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes that have been captured
    pub fn processed_count(&self) -> usize {
        self.iter().filter(|node| node.processed).count()
    }
}
