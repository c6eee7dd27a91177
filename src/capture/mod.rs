//! Capture pipeline
//!
//! Turns a visited node into artifacts on disk. Downloadable content (an
//! attachment, or a URL whose extension maps to a downloadable MIME type) is
//! fetched by navigating the browser to it so the browser saves it into the
//! staging directory. Everything else is rendered as a stitched full-page
//! image (or handed to the PDF renderer), optionally with its HTML source.

mod mime;
mod naming;
mod pdf;
mod stitch;

pub use mime::{downloadable_mime_types, guess_mime, is_downloadable, OFFICE_TYPES};
pub use naming::{artifact_path, artifact_stem, unique_file_name, ArtifactKind};
pub use pdf::PdfExporter;
pub use stitch::{fullpage_screenshot, measure_page, paste_tile, plan_tiles, PageGeometry, Tile};

use crate::browser::{Browser, BrowserError};
use crate::state::Node;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while producing artifacts
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Download of {url} timed out")]
    DownloadTimeout { url: String },

    #[error("Download of {url} failed: {source}")]
    DownloadError {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Unusable page geometry: {0}")]
    Geometry(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF export failed: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// True when the underlying cause was a navigation timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::DownloadTimeout { .. } => true,
            Self::Browser(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// What was produced for a node; recorded in the items table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Image,
    Pdf,
    /// Only the HTML source was kept
    Source,
    Download,
    DryRun,
    /// Nothing was requested for this node
    Skipped,
}

impl CaptureOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Source => "source",
            Self::Download => "download",
            Self::DryRun => "dry-run",
            Self::Skipped => "skipped",
        }
    }
}

/// Switches and delays that shape what the pipeline produces
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub export_to_pdf: bool,
    pub only_downloadable: bool,
    pub get_source: bool,
    pub windows_filenames: bool,

    /// Wait after each scroll while stitching
    pub scroll_settle: Duration,

    /// Wait after a node's artifacts are written
    pub post_capture: Duration,

    /// Wait after navigating to a downloadable URL
    pub download_settle: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            export_to_pdf: false,
            only_downloadable: false,
            get_source: false,
            windows_filenames: false,
            scroll_settle: Duration::from_millis(200),
            post_capture: Duration::from_millis(300),
            download_settle: Duration::from_millis(500),
        }
    }
}

/// Produces artifacts for nodes under one output directory
#[derive(Debug, Clone)]
pub struct CapturePipeline {
    output_dir: PathBuf,
    options: CaptureOptions,
    pdf: PdfExporter,
}

impl CapturePipeline {
    pub fn new(output_dir: impl Into<PathBuf>, options: CaptureOptions, pdf: PdfExporter) -> Self {
        Self {
            output_dir: output_dir.into(),
            options,
            pdf,
        }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// True when the page needs to be loaded in the browser before capture
    pub fn needs_page(&self) -> bool {
        !self.options.only_downloadable || self.options.get_source
    }

    /// Navigates to a downloadable URL so the browser saves it
    pub async fn download<B: Browser>(&self, browser: &mut B, url: &str) -> CaptureResult<CaptureOutcome> {
        tracing::info!("Downloading {}", url);
        match browser.navigate(url).await {
            Ok(()) => {
                tokio::time::sleep(self.options.download_settle).await;
                Ok(CaptureOutcome::Download)
            }
            Err(e) if e.is_timeout() => Err(CaptureError::DownloadTimeout { url: url.to_string() }),
            Err(source) => Err(CaptureError::DownloadError {
                url: url.to_string(),
                source,
            }),
        }
    }

    /// Captures a page that is already loaded in the browser
    ///
    /// `seq` is the crawl-wide processed counter, which keeps file names
    /// unique across nodes that share a URL stem.
    pub async fn capture_page<B: Browser>(
        &self,
        browser: &mut B,
        node: &Node,
        seq: u64,
    ) -> CaptureResult<CaptureOutcome> {
        let stem = artifact_stem(&node.url, self.options.windows_filenames);
        let mut outcome = CaptureOutcome::Skipped;

        if !self.options.only_downloadable {
            if self.options.export_to_pdf {
                let path = self.prepare(node.level, ArtifactKind::Pdf, &stem, seq).await?;
                self.pdf.export(&node.url, &path).await?;
                outcome = CaptureOutcome::Pdf;
            } else {
                let path = self.prepare(node.level, ArtifactKind::Screenshot, &stem, seq).await?;
                tracing::info!("Exporting {} to {}", node.url, path.display());
                let canvas = fullpage_screenshot(browser, self.options.scroll_settle).await?;
                canvas.save_with_format(&path, ImageFormat::Png)?;
                outcome = CaptureOutcome::Image;
            }
        }

        if self.options.get_source {
            match node.dom_snapshot.as_deref() {
                Some(source) => {
                    let path = self.prepare(node.level, ArtifactKind::Source, &stem, seq).await?;
                    tokio::fs::write(&path, source).await?;
                    if outcome == CaptureOutcome::Skipped {
                        outcome = CaptureOutcome::Source;
                    }
                }
                None => tracing::info!("{} has no page source, skipping HTML export", node.url),
            }
        }

        tokio::time::sleep(self.options.post_capture).await;
        Ok(outcome)
    }

    /// Creates the artifact's directory and returns its path
    async fn prepare(&self, level: u32, kind: ArtifactKind, stem: &str, seq: u64) -> CaptureResult<PathBuf> {
        let path = artifact_path(&self.output_dir, level, kind, stem, seq);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(path)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory browser for unit tests

    use crate::browser::{Browser, BrowserError, BrowserResult, Cookie};
    use image::{DynamicImage, Rgba, RgbaImage};
    use serde_json::{json, Value};
    use std::collections::{HashMap, HashSet};

    #[derive(Debug, Default)]
    pub struct FakeBrowser {
        pub pages: HashMap<String, String>,
        pub timeouts: HashSet<String>,
        pub current: String,
        pub navigations: Vec<String>,
        pub clicks: Vec<String>,
        /// Location the browser moves to when an element id is clicked
        pub click_targets: HashMap<String, String>,
        pub scripts: Vec<String>,
        pub cookies: Vec<Cookie>,
        pub total_height: u32,
        pub viewport_height: u32,
        pub width: u32,
        pub closed: bool,
    }

    impl FakeBrowser {
        pub fn new() -> Self {
            Self {
                total_height: 25,
                viewport_height: 10,
                width: 8,
                ..Self::default()
            }
        }

        pub fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }
    }

    impl Browser for FakeBrowser {
        async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
            self.navigations.push(url.to_string());
            if self.timeouts.contains(url) {
                return Err(BrowserError::Timeout(url.to_string()));
            }
            self.current = url.to_string();
            Ok(())
        }

        async fn current_url(&mut self) -> BrowserResult<String> {
            Ok(self.current.clone())
        }

        async fn page_source(&mut self) -> BrowserResult<String> {
            Ok(self.pages.get(&self.current).cloned().unwrap_or_default())
        }

        async fn click_by_id(&mut self, id: &str) -> BrowserResult<()> {
            self.clicks.push(id.to_string());
            if let Some(target) = self.click_targets.get(id) {
                self.current = target.clone();
            }
            Ok(())
        }

        async fn execute_script(&mut self, script: &str) -> BrowserResult<Value> {
            self.scripts.push(script.to_string());
            Ok(match script {
                "return document.body.offsetWidth" | "return document.body.clientWidth" => {
                    json!(self.width)
                }
                "return document.body.parentNode.scrollHeight" => json!(self.total_height),
                "return window.innerHeight" => json!(self.viewport_height),
                _ => Value::Null,
            })
        }

        async fn screenshot_viewport(&mut self) -> BrowserResult<DynamicImage> {
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                self.width,
                self.viewport_height,
                Rgba([0, 128, 255, 255]),
            )))
        }

        async fn add_cookie(&mut self, cookie: &Cookie) -> BrowserResult<()> {
            self.cookies.push(cookie.clone());
            Ok(())
        }

        async fn close(&mut self) -> BrowserResult<()> {
            self.closed = true;
            Ok(())
        }
    }
}
