//! URL handling module for Deepshot
//!
//! This module provides link canonicalization, registrable-domain extraction
//! and the scope filter that decides which links belong to the crawl.

mod canonicalize;
mod domain;
mod scope;

// Re-export main functions
pub use canonicalize::{canonicalize, resolve, split_fragment, Anchor, Canonical};
pub use domain::registrable_domain;
pub use scope::{ScopeFilter, ScopeVerdict};

/// Strips trailing slashes the same way canonical URLs are stored
///
/// Used to compare a browser-reported location with a stored node URL.
pub fn strip_trailing_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}
