use crate::url::domain::registrable_domain;

/// Outcome of checking a canonical URL against the crawl scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeVerdict {
    /// URL belongs to the crawl; carries its registrable domain
    InScope(String),
    /// URL has no parseable registrable domain
    InvalidUrl,
    /// Domain not allowed, or a required substring is missing
    OutOfScope,
}

/// Decides membership in the allowed domain set and required sub-paths
#[derive(Debug, Clone, Default)]
pub struct ScopeFilter {
    allowed_domains: Vec<String>,
    required_substrings: Vec<String>,
}

impl ScopeFilter {
    /// Creates a filter from allowed registrable domains and required substrings
    ///
    /// Domains are compared lowercase; empty substrings are dropped.
    pub fn new<D, S>(allowed_domains: D, required_substrings: S) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|d| d.as_ref().trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
            required_substrings: required_substrings
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    pub fn required_substrings(&self) -> &[String] {
        &self.required_substrings
    }

    /// Checks a canonical URL
    ///
    /// 1. No registrable domain → `InvalidUrl`
    /// 2. Domain outside the allowed set → `OutOfScope`
    /// 3. Any required substring absent from the URL → `OutOfScope`
    pub fn check(&self, url: &str) -> ScopeVerdict {
        let domain = match registrable_domain(url) {
            Ok(domain) => domain,
            Err(_) => return ScopeVerdict::InvalidUrl,
        };

        if !self.allowed_domains.iter().any(|allowed| *allowed == domain) {
            return ScopeVerdict::OutOfScope;
        }

        if !self
            .required_substrings
            .iter()
            .all(|required| url.contains(required.as_str()))
        {
            return ScopeVerdict::OutOfScope;
        }

        ScopeVerdict::InScope(domain)
    }
}
