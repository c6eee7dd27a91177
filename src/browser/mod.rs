//! Browser capability
//!
//! The crawler never talks to a specific browser directly. It drives anything
//! implementing [`Browser`]: navigation, location queries, page source,
//! click-by-id, script execution and single-viewport screenshots. The
//! production implementation is a W3C WebDriver client ([`WebDriver`]).

mod capabilities;
mod cookies;
mod webdriver;

pub use capabilities::{session_capabilities, BrowserKind};
pub use cookies::{load_cookies, Cookie};
pub use webdriver::{SessionOptions, WebDriver};

use image::DynamicImage;
use thiserror::Error;

/// Errors raised by a browser session
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Navigation or page load exceeded the session timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("No element with id '{0}'")]
    NoSuchElement(String),

    /// The WebDriver endpoint answered with an error payload
    #[error("WebDriver command {command} failed: {error}: {message}")]
    Command {
        command: String,
        error: String,
        message: String,
    },

    #[error("Unexpected WebDriver response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Screenshot decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Screenshot image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Cookie file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Navigation / DOM / screenshot capability of a browser session
///
/// Calls are sequential; every method may fail with
/// [`BrowserError::Timeout`].
#[allow(async_fn_in_trait)]
pub trait Browser {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    async fn current_url(&mut self) -> BrowserResult<String>;

    async fn page_source(&mut self) -> BrowserResult<String>;

    async fn click_by_id(&mut self, id: &str) -> BrowserResult<()>;

    /// Runs a synchronous script and returns its JSON result
    async fn execute_script(&mut self, script: &str) -> BrowserResult<serde_json::Value>;

    /// Captures what is currently visible in the viewport
    async fn screenshot_viewport(&mut self) -> BrowserResult<DynamicImage>;

    async fn add_cookie(&mut self, cookie: &Cookie) -> BrowserResult<()>;

    /// Ends the session; further calls are undefined
    async fn close(&mut self) -> BrowserResult<()>;
}
