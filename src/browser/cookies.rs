use super::BrowserResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A WebDriver cookie
///
/// Field names follow the W3C cookie object so an exported jar can be loaded
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

/// Loads a pre-serialized cookie set (a JSON array of cookie objects)
pub fn load_cookies(path: &Path) -> BrowserResult<Vec<Cookie>> {
    let content = std::fs::read_to_string(path)?;
    let cookies: Vec<Cookie> = serde_json::from_str(&content)?;
    tracing::debug!("Loaded {} cookies from {}", cookies.len(), path.display());
    Ok(cookies)
}
