use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Deepshot
///
/// Built from command-line arguments, with the optional tuning file supplying
/// delays, WebDriver connection details and retry bounds.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL the crawl starts from (level 0)
    pub start_url: String,

    /// Registrable domains that are in scope
    pub allowed_domains: Vec<String>,

    /// Root directory for artifacts and checkpoint tables
    pub output_dir: PathBuf,

    /// Substrings every in-scope URL must contain
    pub sub_urls: Vec<String>,

    /// Maximum depth; level L is only expanded when `levels > L`
    pub levels: u32,

    /// JSON cookie file added to the session before crawling
    pub cookies: Option<PathBuf>,

    pub dry_run: bool,
    pub export_to_pdf: bool,
    pub chrome: bool,
    pub only_downloadable: bool,
    pub get_source: bool,
    pub search_result_links: bool,
    pub windows_filenames: bool,

    pub tuning: Tuning,
}

impl Config {
    /// Creates a configuration with every switch off and default tuning
    pub fn new(
        start_url: impl Into<String>,
        allowed_domains: Vec<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            start_url: start_url.into(),
            allowed_domains,
            output_dir: output_dir.into(),
            sub_urls: Vec::new(),
            levels: 0,
            cookies: None,
            dry_run: false,
            export_to_pdf: false,
            chrome: false,
            only_downloadable: false,
            get_source: false,
            search_result_links: false,
            windows_filenames: false,
            tuning: Tuning::default(),
        }
    }

    /// Directory the browser downloads into before files are placed
    pub fn staging_dir(&self) -> PathBuf {
        self.output_dir.join("main")
    }
}

/// Contents of the optional TOML tuning file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub timing: TimingConfig,
    pub webdriver: WebDriverConfig,
    pub checkpoint: CheckpointConfig,
    pub retry: RetryConfig,
    pub pdf: PdfConfig,
}

/// Settle delays, in milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait after the first navigation, leaving time for a manual login
    #[serde(rename = "start-settle-ms")]
    pub start_settle_ms: u64,

    #[serde(rename = "navigation-settle-ms")]
    pub navigation_settle_ms: u64,

    #[serde(rename = "click-settle-ms")]
    pub click_settle_ms: u64,

    #[serde(rename = "scroll-settle-ms")]
    pub scroll_settle_ms: u64,

    #[serde(rename = "post-capture-ms")]
    pub post_capture_ms: u64,

    #[serde(rename = "cookie-settle-ms")]
    pub cookie_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_settle_ms: 60_000,
            navigation_settle_ms: 1_000,
            click_settle_ms: 1_000,
            scroll_settle_ms: 200,
            post_capture_ms: 300,
            cookie_settle_ms: 500,
        }
    }
}

impl TimingConfig {
    pub fn start_settle(&self) -> Duration {
        Duration::from_millis(self.start_settle_ms)
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn post_capture(&self) -> Duration {
        Duration::from_millis(self.post_capture_ms)
    }

    pub fn cookie_settle(&self) -> Duration {
        Duration::from_millis(self.cookie_settle_ms)
    }

    /// No waiting at all; used by tests and dry runs against fakes
    pub fn immediate() -> Self {
        Self {
            start_settle_ms: 0,
            navigation_settle_ms: 0,
            click_settle_ms: 0,
            scroll_settle_ms: 0,
            post_capture_ms: 0,
            cookie_settle_ms: 0,
        }
    }
}

/// WebDriver endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// Base URL of the WebDriver server (geckodriver, chromedriver, Selenium)
    pub url: String,

    #[serde(rename = "page-load-timeout-secs")]
    pub page_load_timeout_secs: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4444".to_string(),
            page_load_timeout_secs: 30,
        }
    }
}

/// Checkpoint cadence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Save after this many processed nodes
    pub interval: u64,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self { interval: 25 }
    }
}

/// Artifact placement retry bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,

    #[serde(rename = "backoff-ms")]
    pub backoff_ms: u64,

    #[serde(rename = "download-poll-ms")]
    pub download_poll_ms: u64,

    #[serde(rename = "max-download-polls")]
    pub max_download_polls: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 10_000,
            download_poll_ms: 10_000,
            max_download_polls: 30,
        }
    }
}

/// External HTML-to-PDF renderer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub program: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            program: "wkhtmltopdf".to_string(),
        }
    }
}
