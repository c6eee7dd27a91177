//! Error classification
//!
//! Expected per-link and per-node conditions are values, not errors. Each one
//! is logged and, where it has a tally, counted; none of them stops the crawl.

use crate::capture::CaptureError;
use crate::state::{Counters, Decision};
use crate::url::ScopeVerdict;
use std::fmt;

/// Expected, non-fatal conditions met while crawling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No registrable domain; link dropped
    InvalidUrl,
    /// Domain or required substring mismatch; link dropped
    OutOfScope,
    /// Already admitted; counted in the ledger
    Duplicate,
    /// Fragment view already admitted; counted in the ledger
    FragmentDuplicate,
    /// Navigation timed out; counted as both a timeout and an error
    NavigationTimeout,
    /// Artifact generation failed; counted as an error
    CaptureError,
    /// Destination collision during placement, resolved by a unique rename
    MoveConflict,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid-url",
            Self::OutOfScope => "out-of-scope",
            Self::Duplicate => "duplicate",
            Self::FragmentDuplicate => "fragment-duplicate",
            Self::NavigationTimeout => "navigation-timeout",
            Self::CaptureError => "capture-error",
            Self::MoveConflict => "move-conflict",
        }
    }

    pub fn from_scope(verdict: &ScopeVerdict) -> Option<Self> {
        match verdict {
            ScopeVerdict::InScope(_) => None,
            ScopeVerdict::InvalidUrl => Some(Self::InvalidUrl),
            ScopeVerdict::OutOfScope => Some(Self::OutOfScope),
        }
    }

    pub fn from_decision(decision: Decision) -> Option<Self> {
        match decision {
            Decision::New => None,
            Decision::Duplicate => Some(Self::Duplicate),
            Decision::FragmentDuplicate => Some(Self::FragmentDuplicate),
        }
    }

    pub fn from_capture_error(error: &CaptureError) -> Self {
        if error.is_timeout() {
            Self::NavigationTimeout
        } else {
            Self::CaptureError
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Logs a classification and records it in the matching tally
///
/// `key` is the URL (or, for placement failures, the file path). Duplicates
/// are only logged; the ledger already counted them.
pub fn record(counters: &mut Counters, classification: Classification, key: &str) {
    match classification {
        Classification::InvalidUrl => {
            let seen = counters.invalid.record(key);
            tracing::info!("Invalid URL found ({}): {}", seen, key);
        }
        Classification::OutOfScope => {
            let seen = counters.out_of_scope.record(key);
            tracing::info!("Out-of-scope URL found ({}): {}", seen, key);
        }
        Classification::Duplicate | Classification::FragmentDuplicate => {
            tracing::debug!("{} skipped: {}", classification, key);
        }
        Classification::NavigationTimeout => {
            counters.record_timeout(key);
            tracing::error!("Timed out on {}, needs manual collection", key);
        }
        Classification::CaptureError => {
            counters.error.record(key);
            tracing::error!("Capture failed for {}", key);
        }
        Classification::MoveConflict => {
            tracing::warn!("Destination exists for {}, stored under a unique name", key);
        }
    }
}
