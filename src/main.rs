//! Deepshot main entry point
//!
//! This is the command-line interface for the Deepshot site capturer.

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::Parser;
use deepshot::config::{finalize_config, Config};
use deepshot::crawler::run_crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Deepshot: a level-bounded site capturer
///
/// Deepshot walks a site breadth-first through a WebDriver browser session,
/// saves a full-page screenshot (or PDF, or HTML source) of every page and
/// downloads attachments, keeping a resumable checkpoint in the output
/// directory.
#[derive(Parser, Debug)]
#[command(name = "deepshot")]
#[command(version)]
#[command(about = "A level-bounded site capturer", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(short = 's', long, required_unless_present = "stats")]
    start_url: Option<String>,

    /// Comma-separated registrable domains that are in scope
    #[arg(short = 'a', long, value_delimiter = ',', required_unless_present = "stats")]
    allowed_domains: Vec<String>,

    /// Directory for artifacts and checkpoint tables
    #[arg(short = 'o', long)]
    output_dir: PathBuf,

    /// Comma-separated substrings every crawled URL must contain
    #[arg(short = 'b', long, value_delimiter = ',')]
    sub_urls: Vec<String>,

    /// How many levels of links to follow from the start URL
    #[arg(short = 'l', long, default_value_t = 0)]
    levels: u32,

    /// JSON file of cookies to add to the session
    #[arg(short = 'c', long)]
    cookies: Option<PathBuf>,

    /// Walk the site without writing screenshots or downloads
    #[arg(long)]
    dry_run: bool,

    /// Render pages to PDF instead of screenshots
    #[arg(long)]
    export_to_pdf: bool,

    /// Use Chrome instead of Firefox
    #[arg(long)]
    chrome: bool,

    /// Only capture downloadable files
    #[arg(long)]
    only_downloadable: bool,

    /// Also save each page's HTML source
    #[arg(long)]
    get_source: bool,

    /// Only follow anchors marked as search result links
    #[arg(long)]
    search_result_links: bool,

    /// Keep generated file names within 255 characters
    #[arg(long)]
    windows_filenames: bool,

    /// Path to a TOML tuning file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show statistics from the checkpoint in the output directory and exit
    #[arg(long)]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if cli.stats {
        return handle_stats(&cli.output_dir);
    }

    let config = build_config(cli)?;
    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("deepshot=info,warn"),
            1 => EnvFilter::new("deepshot=debug,info"),
            2 => EnvFilter::new("deepshot=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Turns parsed arguments into a validated configuration
fn build_config(cli: Cli) -> anyhow::Result<Config> {
    let start_url = cli.start_url.context("--start-url is required")?;

    let mut config = Config::new(start_url, cli.allowed_domains, cli.output_dir);
    config.sub_urls = cli.sub_urls;
    config.levels = cli.levels;
    config.cookies = cli.cookies;
    config.dry_run = cli.dry_run;
    config.export_to_pdf = cli.export_to_pdf;
    config.chrome = cli.chrome;
    config.only_downloadable = cli.only_downloadable;
    config.get_source = cli.get_source;
    config.search_result_links = cli.search_result_links;
    config.windows_filenames = cli.windows_filenames;

    if let Some(path) = &cli.config {
        tracing::info!("Loading tuning from: {}", path.display());
    }
    finalize_config(config, cli.config.as_deref()).context("Invalid configuration")
}

/// Handles the --stats mode: shows statistics from the checkpoint
fn handle_stats(output_dir: &std::path::Path) -> anyhow::Result<()> {
    use deepshot::output::{load_statistics, print_statistics};
    use deepshot::storage::{open_checkpoint, ITEMS};

    println!("Checkpoint: {}", output_dir.display());

    let store = open_checkpoint(output_dir);
    if let Ok(modified) = std::fs::metadata(store.table_path(&ITEMS)).and_then(|m| m.modified()) {
        let saved: DateTime<Local> = modified.into();
        println!("Last saved: {}", saved.format("%Y-%m-%d %H:%M:%S"));
    }
    println!();

    match load_statistics(&store).context("Failed to read checkpoint")? {
        Some(stats) => print_statistics(&stats),
        None => println!("No checkpoint found"),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} to depth {} (domains: {}, sub-urls: {})",
        config.start_url,
        config.levels,
        config.allowed_domains.join(","),
        config.sub_urls.join(",")
    );

    if config.dry_run {
        tracing::info!("Dry run: nothing will be captured");
    }

    // Run the crawler
    match run_crawl(config).await {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).context("Crawl failed")
        }
    }
}
