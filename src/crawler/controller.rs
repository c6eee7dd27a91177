//! Traversal controller - main crawl orchestration logic
//!
//! This module contains the level-by-level crawl loop that coordinates:
//! - Loading a checkpoint or seeding a fresh state
//! - Start-up navigation, cookies and the resume guard
//! - Capturing every node of a level before the next level starts
//! - Expanding nodes into the next level's frontier
//! - Draining downloads and saving checkpoints
//! - Closing the browser and saving on every exit path

use super::classify::{self, Classification};
use super::links::{page_title, parse_snapshot, DiscoveredLink};
use super::placement::{ArtifactPlacer, RetryPolicy};
use crate::browser::{load_cookies, Browser, BrowserKind, BrowserResult};
use crate::capture::{is_downloadable, CaptureOptions, CaptureOutcome, CapturePipeline, PdfExporter};
use crate::config::Config;
use crate::output::print_results;
use crate::state::{CrawlState, Node};
use crate::storage::CheckpointStore;
use crate::url::{canonicalize, strip_trailing_slash, ScopeFilter};
use crate::{CrawlError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

const RESPONSE_DOWNLOAD_TIMEOUT: &str = "download-timeout";
const RESPONSE_DOWNLOAD_ERROR: &str = "download-error";
const RESPONSE_CAPTURE_ERROR: &str = "capture-error";

/// Whether a node left the processing step captured or still pending
#[derive(Debug, Clone, PartialEq, Eq)]
enum Visit {
    /// Carries the browser location when the page itself was loaded
    Processed(Option<String>),
    Pending,
}

/// Links read from a loaded page, waiting for the expansion pass
#[derive(Debug, Clone)]
struct PageLinks {
    /// Where the browser landed; relative links resolve against it
    base: String,
    links: Vec<DiscoveredLink>,
}

/// Level-bounded breadth-first crawler driving one browser session
pub struct Crawler<B: Browser, S: CheckpointStore> {
    config: Config,
    browser: B,
    store: S,
    state: CrawlState,
    resumed: bool,
    /// Links of the current level's processed nodes, by index in the level
    extracted: HashMap<usize, PageLinks>,
    scope: ScopeFilter,
    pipeline: CapturePipeline,
    placer: ArtifactPlacer,
}

impl<B: Browser, S: CheckpointStore> Crawler<B, S> {
    /// Creates a crawler, resuming from the store's checkpoint if it has one
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    /// * `browser` - An open browser session
    /// * `store` - Where checkpoints are loaded from and saved to
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(CrawlError)` - The existing checkpoint could not be read
    pub fn new(config: Config, browser: B, store: S) -> Result<Self> {
        let checkpoint = store.load()?;
        Ok(Self::from_checkpoint(config, browser, store, checkpoint))
    }

    /// Creates a crawler from an already loaded checkpoint
    pub fn from_checkpoint(config: Config, browser: B, store: S, checkpoint: Option<CrawlState>) -> Self {
        let (state, resumed) = match checkpoint {
            Some(state) if !state.frontier.is_empty() => {
                tracing::info!(
                    "Resuming from checkpoint: {} nodes, {} processed",
                    state.frontier.len(),
                    state.processed_count
                );
                (state, true)
            }
            _ => {
                tracing::info!("No checkpoint found, starting new crawl");
                (CrawlState::seeded(strip_trailing_slash(&config.start_url)), false)
            }
        };

        let kind = if config.chrome {
            BrowserKind::Chrome
        } else {
            BrowserKind::Firefox
        };

        let timing = &config.tuning.timing;
        let options = CaptureOptions {
            export_to_pdf: config.export_to_pdf,
            only_downloadable: config.only_downloadable,
            get_source: config.get_source,
            windows_filenames: config.windows_filenames,
            scroll_settle: timing.scroll_settle(),
            post_capture: timing.post_capture(),
            download_settle: timing.navigation_settle(),
        };
        let pipeline = CapturePipeline::new(
            &config.output_dir,
            options,
            PdfExporter::new(config.tuning.pdf.program.clone()),
        );

        let retry = &config.tuning.retry;
        let policy = RetryPolicy {
            attempts: retry.attempts,
            backoff: Duration::from_millis(retry.backoff_ms),
            download_poll: Duration::from_millis(retry.download_poll_ms),
            max_download_polls: retry.max_download_polls,
        };
        let placer = ArtifactPlacer::local(policy, kind.partial_download_extension());

        let scope = ScopeFilter::new(&config.allowed_domains, &config.sub_urls);

        Self {
            config,
            browser,
            store,
            state,
            resumed,
            extracted: HashMap::new(),
            scope,
            pipeline,
            placer,
        }
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    /// Runs the crawl until it finishes or Ctrl-C is pressed
    pub async fn run(&mut self) -> Result<()> {
        let interrupt = async {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("Cannot listen for Ctrl-C, interrupts will not save");
                std::future::pending::<()>().await;
            }
        };
        self.run_until(interrupt).await
    }

    /// Runs the crawl until it finishes or `cancel` resolves
    ///
    /// Whatever the outcome, the browser is closed and a final checkpoint is
    /// saved before returning. Cancellation returns
    /// [`CrawlError::Interrupted`].
    pub async fn run_until<F: Future>(&mut self, cancel: F) -> Result<()> {
        let outcome = tokio::select! {
            result = self.crawl() => result,
            _ = cancel => {
                tracing::warn!("Interrupted, saving progress");
                Err(CrawlError::Interrupted)
            }
        };

        if let Err(e) = &outcome {
            tracing::error!("Crawl stopped: {}", e);
        }

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }

        let saved = self.checkpoint();
        print_results(&self.state);

        outcome?;
        saved
    }

    /// Start-up navigation followed by the level loop
    async fn crawl(&mut self) -> Result<()> {
        self.open_start_page().await?;

        if self.resumed {
            self.check_resume_location().await?;
        }

        let start_time = std::time::Instant::now();
        let max_depth = self.config.levels;

        for level in 0..=max_depth {
            if self.state.frontier.level_len(level) == 0 {
                tracing::info!("No nodes at level {}, crawl complete", level);
                break;
            }

            tracing::info!(
                "Level {}: {} nodes",
                level,
                self.state.frontier.level_len(level)
            );
            self.crawl_level(level, max_depth > level).await?;
        }

        tracing::info!(
            "Crawl completed: {} nodes processed in {:?}",
            self.state.processed_count,
            start_time.elapsed()
        );
        Ok(())
    }

    async fn open_start_page(&mut self) -> Result<()> {
        let start = self.config.start_url.clone();
        tracing::info!("Opening {}", start);
        self.browser.navigate(&start).await?;

        if let Some(path) = &self.config.cookies {
            let cookies = load_cookies(path)?;
            for cookie in &cookies {
                self.browser.add_cookie(cookie).await?;
            }
            tokio::time::sleep(self.config.tuning.timing.cookie_settle()).await;
            self.browser.navigate(&start).await?;
            tracing::info!("Added {} cookies", cookies.len());
        }

        tokio::time::sleep(self.config.tuning.timing.start_settle()).await;
        Ok(())
    }

    /// The persisted root must be where the browser landed after start-up
    async fn check_resume_location(&mut self) -> Result<()> {
        let expected = self
            .state
            .frontier
            .root()
            .map(|root| root.url.clone())
            .unwrap_or_default();
        let current = self.browser.current_url().await?;
        let actual = strip_trailing_slash(&current);

        if expected != actual {
            return Err(CrawlError::ResumeMismatch {
                expected,
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    /// Processes every node of one level, then expands them
    ///
    /// Every node of the level reaches `Processed` before the first one is
    /// expanded. Nodes found while expanding go to `level + 1`, so the
    /// level's length is fixed for the duration of both passes. Page sources
    /// are dropped as soon as their links are read; only the link lists wait
    /// for the second pass.
    async fn crawl_level(&mut self, level: u32, expand: bool) -> Result<()> {
        self.extracted.clear();
        let count = self.state.frontier.level_len(level);

        for index in 0..count {
            self.process_at(level, index, expand).await?;
        }

        if expand {
            for index in 0..count {
                self.expand_at(level, index).await?;
            }
        }
        Ok(())
    }

    async fn process_at(&mut self, level: u32, index: usize, expand: bool) -> Result<()> {
        let Some(mut node) = self.state.frontier.node(level, index).cloned() else {
            return Ok(());
        };
        if node.processed {
            return Ok(());
        }

        tracing::info!("Processing {}", node);
        let visit = self.process(&mut node).await?;
        if let Visit::Processed(Some(base)) = &visit {
            if expand && !node.expanded {
                let page = self.extract_links(&mut node, base.clone());
                self.extracted.insert(index, page);
            }
        }
        node.archive();
        self.store_node(level, index, node);

        if let Visit::Processed(_) = visit {
            self.state.processed_count += 1;
            self.after_processed(level).await?;
        }
        Ok(())
    }

    /// Processed → Expanded
    ///
    /// Nodes processed without loading their page (dry run, download-only
    /// mode, or resumed from a checkpoint) are loaded again to read their links. A timeout on
    /// that load leaves the node `Processed`; any other failure expands it
    /// with no links.
    async fn expand_at(&mut self, level: u32, index: usize) -> Result<()> {
        let Some(mut node) = self.state.frontier.node(level, index).cloned() else {
            return Ok(());
        };
        if !node.processed || node.expanded {
            return Ok(());
        }

        let page = match self.extracted.remove(&index) {
            Some(page) => Some(page),
            None => match self.load(&mut node).await {
                Ok(base) => Some(self.extract_links(&mut node, base)),
                Err(e) if e.is_timeout() => {
                    classify::record(&mut self.state.counters, Classification::NavigationTimeout, &node.url);
                    node.archive();
                    self.store_node(level, index, node);
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!("Cannot read links from {}: {}", node.url, e);
                    classify::record(&mut self.state.counters, Classification::CaptureError, &node.url);
                    None
                }
            },
        };

        if let Some(page) = page {
            self.admit_links(&node, page);
        }
        node.mark_expanded()?;
        node.archive();
        self.store_node(level, index, node);
        Ok(())
    }

    fn store_node(&mut self, level: u32, index: usize, node: Node) {
        if let Some(slot) = self.state.frontier.node_mut(level, index) {
            *slot = node;
        }
    }

    /// Pending → Processed
    async fn process(&mut self, node: &mut Node) -> Result<Visit> {
        let dry_run = self.config.dry_run;

        if is_downloadable(&node.url, node.content_class) {
            let response = if dry_run {
                CaptureOutcome::DryRun.as_str()
            } else {
                match self.pipeline.download(&mut self.browser, &node.url).await {
                    Ok(outcome) => outcome.as_str(),
                    Err(e) => {
                        tracing::error!("{}", e);
                        let classification = Classification::from_capture_error(&e);
                        classify::record(&mut self.state.counters, classification, &node.url);
                        if e.is_timeout() {
                            RESPONSE_DOWNLOAD_TIMEOUT
                        } else {
                            RESPONSE_DOWNLOAD_ERROR
                        }
                    }
                }
            };
            // No DOM to mine in a download
            node.mark_processed(response);
            node.mark_expanded()?;
            return Ok(Visit::Processed(None));
        }

        if dry_run {
            node.mark_processed(CaptureOutcome::DryRun.as_str());
            return Ok(Visit::Processed(None));
        }

        if !self.pipeline.needs_page() {
            node.mark_processed(CaptureOutcome::Skipped.as_str());
            return Ok(Visit::Processed(None));
        }

        let base = match self.load(node).await {
            Ok(base) => base,
            Err(e) if e.is_timeout() => {
                classify::record(&mut self.state.counters, Classification::NavigationTimeout, &node.url);
                return Ok(Visit::Pending);
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", node.url, e);
                classify::record(&mut self.state.counters, Classification::CaptureError, &node.url);
                node.mark_processed(RESPONSE_CAPTURE_ERROR);
                return Ok(Visit::Processed(None));
            }
        };

        let seq = self.state.processed_count;
        match self.pipeline.capture_page(&mut self.browser, node, seq).await {
            Ok(outcome) => node.mark_processed(outcome.as_str()),
            Err(e) => {
                tracing::error!("Failed to capture {}: {}", node.url, e);
                let classification = Classification::from_capture_error(&e);
                classify::record(&mut self.state.counters, classification, &node.url);
                if classification == Classification::NavigationTimeout {
                    return Ok(Visit::Pending);
                }
                node.mark_processed(RESPONSE_CAPTURE_ERROR);
            }
        }
        Ok(Visit::Processed(Some(base)))
    }

    /// Navigates to a node, clicks its trigger and keeps the page source
    ///
    /// Returns the browser location after the page settled.
    async fn load(&mut self, node: &mut Node) -> BrowserResult<String> {
        let timing = &self.config.tuning.timing;

        self.browser.navigate(&node.url).await?;
        tokio::time::sleep(timing.navigation_settle()).await;

        if let Some(id) = node.trigger_id.as_deref() {
            tracing::debug!("Clicking #{} on {}", id, node.url);
            self.browser.click_by_id(id).await?;
            tokio::time::sleep(timing.click_settle()).await;
        }

        let source = self.browser.page_source().await?;
        let location = match self.browser.current_url().await {
            Ok(location) => location,
            Err(e) => {
                tracing::debug!("No location for {}: {}", node.url, e);
                node.url.clone()
            }
        };
        if node.title.is_none() {
            node.title = page_title(&source);
        }
        node.dom_snapshot = Some(source);
        Ok(location)
    }

    /// Reads the links out of a node's snapshot and releases the snapshot
    fn extract_links(&self, node: &mut Node, base: String) -> PageLinks {
        let snapshot = node.dom_snapshot.take().unwrap_or_default();
        let parsed = parse_snapshot(&snapshot, self.config.search_result_links);
        if node.title.is_none() {
            node.title = parsed.title;
        }
        PageLinks {
            base,
            links: parsed.links,
        }
    }

    /// Pushes a page's links through scope and dedup into the next level
    fn admit_links(&mut self, node: &Node, page: PageLinks) {
        let mut admitted = 0;
        for link in page.links {
            let canonical = canonicalize(&link.anchor, &page.base);

            let verdict = self.scope.check(&canonical.url);
            if let Some(classification) = Classification::from_scope(&verdict) {
                classify::record(&mut self.state.counters, classification, &canonical.url);
                continue;
            }

            let decision = self
                .state
                .ledger
                .admit(&canonical.url, canonical.trigger_id.as_deref());
            if let Some(classification) = Classification::from_decision(decision) {
                classify::record(&mut self.state.counters, classification, &canonical.url);
                continue;
            }

            tracing::debug!("New link at level {}: {}", node.level + 1, canonical.url);
            self.state.frontier.push(Node::discovered(
                node.level + 1,
                canonical.url,
                node.url.clone(),
                canonical.trigger_id,
                link.content_class,
            ));
            admitted += 1;
        }

        tracing::info!("{} new links from {}", admitted, node.url);
    }

    /// Places staged downloads and saves on the checkpoint cadence
    async fn after_processed(&mut self, level: u32) -> Result<()> {
        if !self.config.dry_run {
            let staging = self.config.staging_dir();
            let destination = self.config.output_dir.join(level.to_string());
            self.placer
                .drain(&staging, &destination, &mut self.state.counters)
                .await;
        }

        let interval = self.config.tuning.checkpoint.interval.max(1);
        if self.state.processed_count % interval == 0 {
            self.checkpoint()?;
            tracing::info!(
                "Progress: {} processed, {} known nodes",
                self.state.processed_count,
                self.state.frontier.len()
            );
        }
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<()> {
        self.store.save(&self.state)?;
        Ok(())
    }
}
