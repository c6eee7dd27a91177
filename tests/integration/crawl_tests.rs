//! Integration tests for the crawler
//!
//! These tests drive the traversal controller against a scripted in-memory
//! site and test the full crawl cycle end-to-end: capture, expansion,
//! checkpointing and resumption.

use deepshot::browser::{Browser, BrowserError, BrowserResult, Cookie};
use deepshot::config::{Config, TimingConfig};
use deepshot::crawler::Crawler;
use deepshot::state::{CrawlState, NodeState};
use deepshot::storage::{CheckpointStore, CsvCheckpointStore, StorageResult};
use deepshot::CrawlError;
use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

/// A browser that serves fixed HTML and reports a fixed page geometry
#[derive(Debug)]
struct ScriptedSite {
    pages: HashMap<String, String>,
    timeouts: HashSet<String>,
    slow: HashSet<String>,
    current: String,
    scroll_y: u32,
    width: u32,
    total_height: u32,
    viewport_height: u32,
    navigations: Vec<String>,
    cookies: Vec<Cookie>,
    closed: bool,
}

impl ScriptedSite {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            timeouts: HashSet::new(),
            slow: HashSet::new(),
            current: String::new(),
            scroll_y: 0,
            width: 4,
            total_height: 30,
            viewport_height: 10,
            navigations: Vec::new(),
            cookies: Vec::new(),
            closed: false,
        }
    }

    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Color of the viewport capture taken at a given scroll offset
    fn tile_color(scroll_y: u32) -> Rgba<u8> {
        Rgba([(scroll_y / 1000) as u8 * 80 + 10, 0, 0, 255])
    }
}

impl Browser for ScriptedSite {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.navigations.push(url.to_string());
        if self.slow.contains(url) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.timeouts.contains(url) {
            return Err(BrowserError::Timeout(url.to_string()));
        }
        self.current = url.to_string();
        self.scroll_y = 0;
        Ok(())
    }

    async fn current_url(&mut self) -> BrowserResult<String> {
        Ok(self.current.clone())
    }

    async fn page_source(&mut self) -> BrowserResult<String> {
        let key = self.current.trim_end_matches('/');
        Ok(self.pages.get(key).cloned().unwrap_or_default())
    }

    async fn click_by_id(&mut self, id: &str) -> BrowserResult<()> {
        Err(BrowserError::NoSuchElement(id.to_string()))
    }

    async fn execute_script(&mut self, script: &str) -> BrowserResult<Value> {
        if let Some(args) = script
            .strip_prefix("window.scrollTo(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            if let Some((_, y)) = args.split_once(", ") {
                self.scroll_y = y.parse().unwrap_or(0);
            }
            return Ok(Value::Null);
        }

        Ok(match script {
            "return document.body.offsetWidth" | "return document.body.clientWidth" => json!(self.width),
            "return document.body.parentNode.scrollHeight" => json!(self.total_height),
            "return window.innerHeight" => json!(self.viewport_height),
            _ => Value::Null,
        })
    }

    async fn screenshot_viewport(&mut self) -> BrowserResult<DynamicImage> {
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            self.width,
            self.viewport_height,
            Self::tile_color(self.scroll_y),
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

/// Checkpoint store that keeps a copy of every save
#[derive(Debug, Default)]
struct RecordingStore {
    saves: Vec<CrawlState>,
}

impl CheckpointStore for RecordingStore {
    fn save(&mut self, state: &CrawlState) -> StorageResult<()> {
        self.saves.push(state.clone());
        Ok(())
    }

    fn load(&self) -> StorageResult<Option<CrawlState>> {
        Ok(None)
    }
}

/// Creates a test configuration rooted at the given output directory
fn create_test_config(dir: &TempDir, levels: u32) -> Config {
    let mut config = Config::new(
        "https://example.com/",
        vec!["example.com".to_string()],
        dir.path(),
    );
    config.levels = levels;
    config.tuning.timing = TimingConfig::immediate();
    config.tuning.retry.backoff_ms = 0;
    config.tuning.retry.download_poll_ms = 0;
    config
}

fn three_branch_site() -> ScriptedSite {
    ScriptedSite::new()
        .page(
            "https://example.com",
            r#"<title>Home</title>
               <a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#,
        )
        .page("https://example.com/a", r#"<a href="/d">D</a><a href="/b">B</a>"#)
        .page("https://example.com/b", r#"<a href="/e">E</a>"#)
        .page("https://example.com/c", r#"<a href="https://elsewhere.org/">X</a>"#)
}

async fn run_to_completion<B: Browser, S: CheckpointStore>(crawler: &mut Crawler<B, S>) {
    crawler
        .run_until(std::future::pending::<()>())
        .await
        .expect("crawl failed");
}

#[tokio::test]
async fn test_breadth_first_ordering() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, 2);
    config.tuning.checkpoint.interval = 1;

    let mut crawler = Crawler::new(config, three_branch_site(), RecordingStore::default()).unwrap();
    run_to_completion(&mut crawler).await;

    let saves = &crawler.store().saves;

    // Saves after root, a, b and c: nothing from level 1 was expanded yet
    for save in &saves[..4] {
        assert!(save.frontier.level(2).is_empty());
    }
    let level1_done = &saves[3];
    assert!(level1_done.frontier.level(1).iter().all(|n| n.processed));

    let state = crawler.state();
    let level2: Vec<_> = state.frontier.level(2).iter().map(|n| n.url.as_str()).collect();
    assert_eq!(level2, vec!["https://example.com/d", "https://example.com/e"]);
    assert_eq!(
        state.frontier.level(2)[0].referrer.as_deref(),
        Some("https://example.com/a")
    );

    let navigations = &crawler.browser().navigations;
    assert_eq!(
        navigations,
        &vec![
            "https://example.com/",
            "https://example.com",
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/c",
            "https://example.com/d",
            "https://example.com/e",
        ]
    );

    // /b found again from /a
    assert_eq!(state.ledger.duplicate_count(), 1);
    assert_eq!(state.ledger.entry("https://example.com/b", None).unwrap().revisit_count, 1);
    assert_eq!(state.counters.out_of_scope.get("https://elsewhere.org"), 1);
    assert_eq!(state.processed_count, 6);
    assert!(crawler.browser().closed);
}

#[tokio::test]
async fn test_required_substring_scope() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, 1);
    config.start_url = "https://example.com/docs".to_string();
    config.sub_urls = vec!["/docs".to_string()];

    let site = ScriptedSite::new().page(
        "https://example.com/docs",
        r#"<a href="/docs/guide">Guide</a><a href="/blog/post">Post</a>"#,
    );

    let mut crawler = Crawler::new(config, site, RecordingStore::default()).unwrap();
    run_to_completion(&mut crawler).await;

    let state = crawler.state();
    let level1: Vec<_> = state.frontier.level(1).iter().map(|n| n.url.as_str()).collect();
    assert_eq!(level1, vec!["https://example.com/docs/guide"]);
    assert_eq!(state.counters.out_of_scope.get("https://example.com/blog/post"), 1);
}

#[tokio::test]
async fn test_stitched_screenshot_geometry() {
    let dir = TempDir::new().unwrap();
    let mut site = ScriptedSite::new().page("https://example.com", "<title>Tall</title>");
    site.total_height = 2500;
    site.viewport_height = 1000;

    let mut crawler = Crawler::new(create_test_config(&dir, 0), site, RecordingStore::default()).unwrap();
    run_to_completion(&mut crawler).await;

    let root = crawler.state().frontier.root().unwrap();
    assert_eq!(root.response.as_deref(), Some("image"));

    let shot = image::open(dir.path().join("0/screenshots/example.com_0.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(shot.dimensions(), (4, 2500));

    // Third tile pasted at 1500 so its bottom meets the page bottom
    assert_eq!(shot.get_pixel(0, 999), &ScriptedSite::tile_color(0));
    assert_eq!(shot.get_pixel(0, 1000), &ScriptedSite::tile_color(1000));
    assert_eq!(shot.get_pixel(0, 1499), &ScriptedSite::tile_color(1000));
    assert_eq!(shot.get_pixel(0, 1500), &ScriptedSite::tile_color(2000));
    assert_eq!(shot.get_pixel(3, 2499), &ScriptedSite::tile_color(2000));
}

#[tokio::test]
async fn test_resume_skips_processed_nodes() {
    let dir = TempDir::new().unwrap();

    let mut first_site = three_branch_site();
    first_site.timeouts.insert("https://example.com/b".to_string());
    let mut first = Crawler::new(
        create_test_config(&dir, 1),
        first_site,
        CsvCheckpointStore::new(dir.path()),
    )
    .unwrap();
    run_to_completion(&mut first).await;

    let b = first.state().frontier.node(1, 1).unwrap();
    assert_eq!(b.state(), NodeState::Pending);
    assert_eq!(first.state().counters.timeout.get("https://example.com/b"), 1);

    let mut second = Crawler::new(
        create_test_config(&dir, 1),
        three_branch_site(),
        CsvCheckpointStore::new(dir.path()),
    )
    .unwrap();
    assert!(second.is_resumed());
    run_to_completion(&mut second).await;

    // Only the start page and the node that timed out are visited again
    assert_eq!(
        second.browser().navigations,
        vec!["https://example.com/", "https://example.com/b"]
    );

    let state = second.state();
    assert_eq!(state.frontier.level_len(1), 3);
    assert!(state.frontier.level(1).iter().all(|n| n.processed));
    assert_eq!(state.processed_count, 4);
    assert_eq!(state.counters.timeout.count(), 1);
    assert_eq!(state.ledger.duplicate_count(), 0);
}

#[tokio::test]
async fn test_interrupt_still_saves() {
    let dir = TempDir::new().unwrap();
    let mut site = three_branch_site();
    site.slow.insert("https://example.com/a".to_string());

    let mut crawler = Crawler::new(
        create_test_config(&dir, 1),
        site,
        CsvCheckpointStore::new(dir.path()),
    )
    .unwrap();

    let err = crawler
        .run_until(tokio::time::sleep(Duration::from_millis(200)))
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlError::Interrupted));
    assert!(crawler.browser().closed);

    let saved = CsvCheckpointStore::new(dir.path()).load().unwrap().unwrap();
    let root = saved.frontier.root().unwrap();
    assert!(root.processed && root.expanded);
    assert_eq!(saved.frontier.level_len(1), 3);
    assert!(!saved.frontier.node(1, 0).unwrap().processed);
    assert_eq!(saved.processed_count, 1);
}

#[tokio::test]
async fn test_cookies_added_before_crawl() {
    let dir = TempDir::new().unwrap();
    let mut cookie_file = NamedTempFile::new().unwrap();
    cookie_file
        .write_all(br#"[{"name": "session", "value": "abc", "domain": "example.com"}]"#)
        .unwrap();
    cookie_file.flush().unwrap();

    let mut config = create_test_config(&dir, 0);
    config.cookies = Some(cookie_file.path().to_path_buf());

    let mut crawler = Crawler::new(config, three_branch_site(), RecordingStore::default()).unwrap();
    run_to_completion(&mut crawler).await;

    let browser = crawler.browser();
    assert_eq!(browser.cookies.len(), 1);
    assert_eq!(browser.cookies[0].name, "session");
    assert_eq!(
        &browser.navigations[..2],
        &["https://example.com/".to_string(), "https://example.com/".to_string()]
    );
}

#[tokio::test]
async fn test_click_failure_counted_as_error() {
    let dir = TempDir::new().unwrap();
    let site = ScriptedSite::new().page(
        "https://example.com",
        r##"<a href="#" onclick="reveal()"><span id="panel">Panel</span></a>"##,
    );

    let mut crawler = Crawler::new(create_test_config(&dir, 1), site, RecordingStore::default()).unwrap();
    run_to_completion(&mut crawler).await;

    let state = crawler.state();
    let panel = state.frontier.node(1, 0).unwrap();
    assert_eq!(panel.trigger_id.as_deref(), Some("panel"));
    assert_eq!(panel.response.as_deref(), Some("capture-error"));
    assert_eq!(state.counters.error.count(), 1);
    assert_eq!(state.counters.timeout.count(), 0);
}
