//! Node definitions for tracking crawl progress
//!
//! A node is one discovered page. Its lifecycle is derived from the
//! `processed` / `expanded` flags plus whether its DOM snapshot is still held.

use std::fmt;

/// Represents where a node is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Discovered and admitted, not yet captured
    Pending,

    /// Artifacts captured (or deliberately skipped); outbound links not yet extracted
    Processed,

    /// Outbound links extracted and enqueued; DOM snapshot still in memory
    Expanded,

    /// Snapshot released; the node lives on only in checkpoint form
    Archived,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Expanded => "expanded",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content classification that changes how a node is captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentClass {
    /// Link flagged as a file attachment by the page markup
    Attachment,
}

impl ContentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attachment => "attachment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "attachment" => Some(Self::Attachment),
            _ => None,
        }
    }
}

/// Error raised when a node is moved out of lifecycle order
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid node transition for {url}: {from} -> {to}")]
pub struct TransitionError {
    pub url: String,
    pub from: NodeState,
    pub to: NodeState,
}

/// One discovered page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Depth from the start URL
    pub level: u32,

    /// `<title>` of the page, once seen
    pub title: Option<String>,

    /// Canonical absolute URL
    pub url: String,

    /// URL of the node that discovered this one (None only for the root)
    pub referrer: Option<String>,

    /// Short description of the capture outcome
    pub response: Option<String>,

    /// Element to click after navigating to reveal the real content
    pub trigger_id: Option<String>,

    /// Export link carried over from earlier checkpoints
    pub pdf_export_link: Option<String>,

    /// Optional classification influencing capture strategy
    pub content_class: Option<ContentClass>,

    pub processed: bool,
    pub expanded: bool,

    /// HTML captured after navigation; transient, never persisted
    pub dom_snapshot: Option<String>,
}

impl Node {
    /// Creates the level-0 node for the start URL
    pub fn root(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Creates a node for a link that survived admission
    pub fn discovered(
        level: u32,
        url: impl Into<String>,
        referrer: impl Into<String>,
        trigger_id: Option<String>,
        content_class: Option<ContentClass>,
    ) -> Self {
        Self {
            level,
            url: url.into(),
            referrer: Some(referrer.into()),
            trigger_id,
            content_class,
            ..Self::default()
        }
    }

    /// Returns the lifecycle state derived from the node's flags
    pub fn state(&self) -> NodeState {
        if !self.processed {
            NodeState::Pending
        } else if !self.expanded {
            NodeState::Processed
        } else if self.dom_snapshot.is_some() {
            NodeState::Expanded
        } else {
            NodeState::Archived
        }
    }

    /// Pending → Processed, recording the capture outcome
    pub fn mark_processed(&mut self, response: impl Into<String>) {
        self.processed = true;
        self.response = Some(response.into());
    }

    /// Processed → Expanded
    pub fn mark_expanded(&mut self) -> Result<(), TransitionError> {
        if !self.processed {
            return Err(TransitionError {
                url: self.url.clone(),
                from: self.state(),
                to: NodeState::Expanded,
            });
        }
        self.expanded = true;
        Ok(())
    }

    /// Releases the in-memory DOM snapshot
    pub fn archive(&mut self) {
        self.dom_snapshot = None;
    }

    pub fn is_attachment(&self) -> bool {
        self.content_class == Some(ContentClass::Attachment)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "level={}, url={}, trigger={}, referrer={}",
            self.level,
            self.url,
            self.trigger_id.as_deref().unwrap_or("-"),
            self.referrer.as_deref().unwrap_or("-")
        )
    }
}
