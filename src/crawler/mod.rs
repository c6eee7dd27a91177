//! Crawler module for level-bounded page capture
//!
//! This module contains the core crawling logic, including:
//! - Link extraction from DOM snapshots
//! - Classification of expected, non-fatal conditions
//! - Download placement with retries
//! - Overall traversal control

mod classify;
mod controller;
mod links;
mod placement;

pub use classify::{record as record_classification, Classification};
pub use controller::Crawler;
pub use links::{attachment_download_href, page_title, parse_snapshot, DiscoveredLink, ParsedPage};
pub use placement::{ArtifactFs, ArtifactPlacer, LocalFs, Placement, RetryPolicy};

use crate::browser::{BrowserKind, SessionOptions, WebDriver};
use crate::config::Config;
use crate::storage::{open_checkpoint, CheckpointStore};
use crate::Result;
use std::time::Duration;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the checkpoint in the output directory, or seed a new crawl
/// 2. Open a WebDriver session that downloads into the staging directory
/// 3. Visit and capture every level up to the configured depth
/// 4. Save the checkpoint and close the session, even when interrupted
///
/// # Arguments
///
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(())` - Crawl completed successfully
/// * `Err(CrawlError)` - Crawl failed or was interrupted
///
/// # Example
///
/// ```no_run
/// use deepshot::config::Config;
/// use deepshot::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::new("https://example.com", vec!["example.com".into()], "out");
/// run_crawl(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<()> {
    let staging = config.staging_dir();
    std::fs::create_dir_all(&staging)?;

    let options = SessionOptions {
        webdriver_url: config.tuning.webdriver.url.clone(),
        kind: if config.chrome {
            BrowserKind::Chrome
        } else {
            BrowserKind::Firefox
        },
        download_dir: std::path::absolute(&staging)?,
        page_load_timeout: Duration::from_secs(config.tuning.webdriver.page_load_timeout_secs),
    };

    // An unreadable checkpoint must fail before a session is opened
    let store = open_checkpoint(&config.output_dir);
    let checkpoint = store.load()?;

    let browser = WebDriver::connect(&options).await?;
    let mut crawler = Crawler::from_checkpoint(config, browser, store, checkpoint);
    crawler.run().await
}
