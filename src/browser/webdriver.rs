//! W3C WebDriver client
//!
//! Speaks the WebDriver wire protocol to a driver process (geckodriver,
//! chromedriver or a Selenium server) over plain HTTP:
//! - Session creation with download preferences and a page-load timeout
//! - Navigation, location and page-source queries
//! - Element lookup by id and click
//! - Synchronous script execution
//! - Viewport screenshots (base64 PNG)
//! - Cookie injection and session teardown

use super::capabilities::{session_capabilities, BrowserKind};
use super::cookies::Cookie;
use super::{Browser, BrowserError, BrowserResult};
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

/// Key under which W3C drivers return element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Extra slack on the HTTP timeout so the driver's own page-load timeout
/// fires first and comes back as a proper error payload
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(30);

/// Settings for opening a WebDriver session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Base URL of the driver endpoint, e.g. `http://localhost:4444`
    pub webdriver_url: String,
    pub kind: BrowserKind,

    /// Where the browser should drop downloaded files
    pub download_dir: PathBuf,

    pub page_load_timeout: Duration,
}

/// A live WebDriver session
#[derive(Debug)]
pub struct WebDriver {
    client: Client,
    base_url: String,
    session_id: String,
    closed: bool,
}

impl WebDriver {
    /// Opens a new session and applies the page-load timeout
    pub async fn connect(options: &SessionOptions) -> BrowserResult<Self> {
        let client = Client::builder()
            .timeout(options.page_load_timeout + HTTP_TIMEOUT_SLACK)
            .build()?;
        let base_url = options.webdriver_url.trim_end_matches('/').to_string();

        let body = session_capabilities(options.kind, &options.download_dir);
        let response = client
            .post(format!("{}/session", base_url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let value = read_value("new session", response).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::InvalidResponse(format!("no sessionId in {}", value)))?
            .to_string();

        tracing::info!(
            "Opened {:?} WebDriver session {} at {}",
            options.kind,
            session_id,
            base_url
        );

        let driver = Self {
            client,
            base_url,
            session_id,
            closed: false,
        };

        driver
            .command(
                Method::POST,
                "/timeouts",
                Some(json!({ "pageLoad": options.page_load_timeout.as_millis() as u64 })),
            )
            .await?;

        Ok(driver)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Sends a session-scoped command and returns the `value` member
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> BrowserResult<Value> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(transport_error)?;
        read_value(&format!("{} {}", method, path), response).await
    }

    async fn find_element_by_id(&self, id: &str) -> BrowserResult<String> {
        let selector = format!("[id=\"{}\"]", id.replace('"', "\\\""));
        let value = self
            .command(
                Method::POST,
                "/element",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await
            .map_err(|e| match e {
                BrowserError::Command { ref error, .. } if error == "no such element" => {
                    BrowserError::NoSuchElement(id.to_string())
                }
                other => other,
            })?;

        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BrowserError::InvalidResponse(format!("no element reference in {}", value)))
    }
}

/// Maps a reqwest failure, keeping timeouts distinguishable
fn transport_error(error: reqwest::Error) -> BrowserError {
    if error.is_timeout() {
        BrowserError::Timeout(error.to_string())
    } else {
        BrowserError::Http(error)
    }
}

/// Reads a WebDriver response, turning error payloads into `BrowserError`
async fn read_value(command: &str, response: reqwest::Response) -> BrowserResult<Value> {
    let status = response.status();
    let mut body: Value = response.json().await.map_err(transport_error)?;
    let value = body.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if error == "timeout" {
            return Err(BrowserError::Timeout(format!("{}: {}", command, message)));
        }
        return Err(BrowserError::Command {
            command: command.to_string(),
            error: error.to_string(),
            message,
        });
    }

    if !status.is_success() {
        return Err(BrowserError::InvalidResponse(format!(
            "{} returned HTTP {}",
            command, status
        )));
    }

    Ok(value)
}

impl Browser for WebDriver {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        tracing::debug!("Navigating to {}", url);
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn current_url(&mut self) -> BrowserResult<String> {
        let value = self.command(Method::GET, "/url", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::InvalidResponse(format!("url is not a string: {}", value)))
    }

    async fn page_source(&mut self) -> BrowserResult<String> {
        let value = self.command(Method::GET, "/source", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::InvalidResponse("page source is not a string".to_string()))
    }

    async fn click_by_id(&mut self, id: &str) -> BrowserResult<()> {
        let element = self.find_element_by_id(id).await?;
        self.command(
            Method::POST,
            &format!("/element/{}/click", element),
            Some(json!({})),
        )
        .await
        .map(|_| ())
    }

    async fn execute_script(&mut self, script: &str) -> BrowserResult<Value> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": [] })),
        )
        .await
    }

    async fn screenshot_viewport(&mut self) -> BrowserResult<DynamicImage> {
        let value = self.command(Method::GET, "/screenshot", None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| BrowserError::InvalidResponse("screenshot is not a string".to_string()))?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        Ok(image::load_from_memory_with_format(&bytes, ImageFormat::Png)?)
    }

    async fn add_cookie(&mut self, cookie: &Cookie) -> BrowserResult<()> {
        self.command(Method::POST, "/cookie", Some(json!({ "cookie": cookie })))
            .await
            .map(|_| ())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.command(Method::DELETE, "", None).await?;
        tracing::info!("Closed WebDriver session {}", self.session_id);
        Ok(())
    }
}
