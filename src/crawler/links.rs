//! Link extraction from DOM snapshots
//!
//! This module parses a page's HTML source to extract:
//! - The page title
//! - Every anchor worth following, as raw [`Anchor`] values ready for
//!   canonicalization
//!
//! Two markup conventions are recognised. Anchors with
//! `data-type="attachment"` point at a preview page; they are rewritten to the
//! direct download URL and flagged as attachments. Anchors of the form
//! `<a href="#" onclick="...">` carry the id of their first nested element so
//! the crawler can click through to the real content.

use crate::state::ContentClass;
use crate::url::Anchor;
use scraper::{ElementRef, Html, Selector};

const SEARCH_RESULT_CLASSES: [&str; 2] = ["search-result-link", "visitable"];

/// A link found on a page, before canonicalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    pub anchor: Anchor,
    pub content_class: Option<ContentClass>,
}

/// Extracted information from a DOM snapshot
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Anchors in document order
    pub links: Vec<DiscoveredLink>,
}

/// Parses a DOM snapshot and extracts its title and anchors
///
/// With `search_result_links`, only anchors carrying both the
/// `search-result-link` and `visitable` classes are kept.
///
/// # Example
///
/// ```
/// use deepshot::crawler::parse_snapshot;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_snapshot(html, false);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].anchor.href, "/page");
/// ```
pub fn parse_snapshot(html: &str, search_result_links: bool) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, search_result_links),
    }
}

/// Extracts only the `<title>` of a DOM snapshot
pub fn page_title(html: &str) -> Option<String> {
    extract_title(&Html::parse_document(html))
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_links(document: &Html, search_result_links: bool) -> Vec<DiscoveredLink> {
    let (Ok(a_selector), Ok(id_selector)) = (Selector::parse("a"), Selector::parse("[id]"))
    else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| !search_result_links || is_search_result(element))
        .filter_map(|element| discovered_link(&element, &id_selector))
        .collect()
}

fn is_search_result(element: &ElementRef<'_>) -> bool {
    SEARCH_RESULT_CLASSES
        .iter()
        .all(|class| element.value().classes().any(|c| c == *class))
}

fn discovered_link(element: &ElementRef<'_>, id_selector: &Selector) -> Option<DiscoveredLink> {
    let value = element.value();
    let onclick = value
        .attr("onclick")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    // A script-only anchor behaves like href="#"
    let mut href = match (value.attr("href"), &onclick) {
        (Some(href), _) => href.trim().to_string(),
        (None, Some(_)) => "#".to_string(),
        (None, None) => return None,
    };
    let mut content_class = None;

    if value.attr("data-type") == Some(ContentClass::Attachment.as_str()) {
        href = attachment_download_href(&href);
        content_class = Some(ContentClass::Attachment);
    }

    let nested_id = element
        .select(id_selector)
        .find_map(|nested| nested.value().id())
        .map(str::to_string);

    Some(DiscoveredLink {
        anchor: Anchor {
            href,
            onclick,
            nested_id,
        },
        content_class,
    })
}

/// Rewrites an attachment preview link to its download URL
///
/// `/pages/viewpage.action?preview=/123/report.pdf` becomes
/// `/download/attachments/123/report.pdf?download=true`. Links without a
/// `preview=` parameter are left as they are.
pub fn attachment_download_href(href: &str) -> String {
    let decoded = urlencoding::decode(href)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| href.to_string());

    match decoded.split("preview=").nth(1) {
        Some(target) => format!("/download/attachments{}?download=true", target),
        None => href.to_string(),
    }
}
