use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// An anchor as found in a DOM snapshot, before canonicalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    /// Raw `href` attribute value
    pub href: String,

    /// Inline `onclick` script, if any
    pub onclick: Option<String>,

    /// Id of the first nested element carrying one
    pub nested_id: Option<String>,
}

impl Anchor {
    /// Creates a plain anchor with only an href
    pub fn plain(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }
}

/// Canonical form of a discovered link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    /// Absolute URL with the trailing slash stripped
    pub url: String,

    /// Element to click after navigating, for script-driven links
    pub trigger_id: Option<String>,
}

fn fragment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)/?(#[^/#]+)$").expect("static regex"))
}

fn shared_page_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"goToSharedPage\((.*)\)").expect("static regex"))
}

/// Resolves an href against a base URL and strips trailing slashes
///
/// Hrefs that cannot be resolved are returned trimmed but otherwise untouched;
/// the scope filter classifies them as invalid later on.
///
/// # Examples
///
/// ```
/// use deepshot::url::resolve;
///
/// assert_eq!(resolve("../b/", "https://example.com/a/page"), "https://example.com/b");
/// assert_eq!(resolve("https://example.com/", "https://other.org"), "https://example.com");
/// ```
pub fn resolve(href: &str, base: &str) -> String {
    let href = href.trim();
    let joined = match Url::parse(base) {
        Ok(base_url) => base_url
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        Err(_) => href.to_string(),
    };
    joined.trim_end_matches('/').to_string()
}

/// Canonicalizes an anchor found on the page at `base`
///
/// A plain href is resolved and stripped. An href of exactly `#` paired with
/// an `onclick` handler is a script-driven link: a nested element id becomes
/// the trigger id, otherwise the quoted argument of a `goToSharedPage(...)`
/// call is resolved as the real target.
pub fn canonicalize(anchor: &Anchor, base: &str) -> Canonical {
    let mut canonical = Canonical {
        url: resolve(&anchor.href, base),
        trigger_id: None,
    };

    if anchor.href.trim() != "#" {
        return canonical;
    }

    let Some(onclick) = anchor.onclick.as_deref() else {
        return canonical;
    };

    if let Some(id) = &anchor.nested_id {
        canonical.trigger_id = Some(id.clone());
    } else if let Some(caps) = shared_page_regex().captures(onclick) {
        let target = caps[1].trim().trim_matches(|c| c == '\'' || c == '"');
        canonical.url = resolve(target, base);
    }

    canonical
}

/// Splits a canonical URL into `(base, "#fragment")`
///
/// Only a fragment that trails the URL with no further `/` counts. A slash
/// directly before the `#` belongs to neither part.
pub fn split_fragment(url: &str) -> Option<(&str, &str)> {
    let caps = fragment_regex().captures(url)?;
    let base = caps.get(1)?.as_str();
    let fragment = caps.get(2)?.as_str();
    if base.is_empty() {
        return None;
    }
    Some((base, fragment))
}
