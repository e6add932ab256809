//! Command-line interface for svgcrawl.
//!
//! Provides commands for crawling a site, extracting a single page,
//! summarizing a finished crawl, and showing the resolved configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;

use crate::adapters::{ChromiumSession, Credentials, SiteProfile};
use crate::config::{self, ResolvedConfig};
use crate::core::{load_report, BreadthFirst, CrawlOutcome, DrillDown, Strategy, TraversalEngine};

/// svgcrawl - Extract SVG process diagrams from an authenticated site
#[derive(Parser, Debug)]
#[command(name = "svgcrawl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that logs in
#[derive(clap::Args, Debug, Clone)]
pub struct SessionArgs {
    /// Site base URL (overrides config)
    #[arg(long, env = "SVGCRAWL_BASE_URL")]
    base_url: Option<String>,

    /// Login username
    #[arg(short, long, env = "SVGCRAWL_USERNAME")]
    username: String,

    /// Login password
    #[arg(short, long, env = "SVGCRAWL_PASSWORD", hide_env_values = true)]
    password: String,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    visible: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl the site and extract diagrams
    Crawl {
        /// Traversal mode
        #[arg(short, long, value_enum, default_value = "sample")]
        mode: CrawlMode,

        /// Sections to visit in sample mode
        #[arg(long, default_value = "3")]
        max_sections: usize,

        /// Processes per section in sample mode
        #[arg(long, default_value = "2")]
        max_processes: usize,

        /// Page budget for breadth-first modes (overrides config)
        #[arg(long)]
        max_pages: Option<usize>,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Extract the largest diagram from a single page
    Extract {
        /// Page URL
        url: String,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Summarize the output of a finished crawl
    Summary {
        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Traversal mode for CLI (maps to Strategy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CrawlMode {
    /// A few sections and processes, to try a site out
    Sample,

    /// Every section and every process
    Full,

    /// Breadth-first over the library tree, filed by breadcrumb
    LibraryRecursive,

    /// Breadth-first over the whole site
    Sitewide,
}

impl CrawlMode {
    /// Build the strategy for this mode
    pub fn strategy(
        self,
        cfg: &ResolvedConfig,
        max_sections: usize,
        max_processes: usize,
        max_pages: Option<usize>,
    ) -> Strategy {
        let extraction = cfg.crawl.drill_down_extraction;
        let max_pages = max_pages.unwrap_or(cfg.crawl.max_pages);

        match self {
            CrawlMode::Sample => Strategy::DrillDown(
                DrillDown::sample(max_sections, max_processes).with_extraction(extraction),
            ),
            CrawlMode::Full => Strategy::DrillDown(DrillDown::full().with_extraction(extraction)),
            CrawlMode::LibraryRecursive => Strategy::BreadthFirst(BreadthFirst::library(
                max_pages,
                cfg.crawl.library_markers.clone(),
            )),
            CrawlMode::Sitewide => Strategy::BreadthFirst(BreadthFirst::sitewide(max_pages)),
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Crawl {
                mode,
                max_sections,
                max_processes,
                max_pages,
                session,
            } => {
                let cfg = config::config()?;
                let strategy = mode.strategy(cfg, max_sections, max_processes, max_pages);
                run_strategy(cfg, &session, &strategy).await
            }
            Commands::Extract { url, session } => {
                let cfg = config::config()?;
                run_strategy(cfg, &session, &Strategy::direct(url)).await
            }
            Commands::Summary { output_dir } => {
                let dir = match output_dir {
                    Some(dir) => dir,
                    None => config::config()?.output_dir.clone(),
                };
                show_summary(&dir).await
            }
            Commands::Config => show_config(),
        }
    }
}

/// Log in, run one strategy, and always close the browser afterwards
async fn run_strategy(cfg: &ResolvedConfig, args: &SessionArgs, strategy: &Strategy) -> Result<()> {
    let mut site: SiteProfile = cfg.site.clone();
    if let Some(ref url) = args.base_url {
        site.base_url = url.clone();
    }
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| cfg.output_dir.clone());
    let credentials = Credentials::new(&args.username, &args.password);

    println!("Starting {} crawl of {}", strategy.name(), site.base_url);
    println!("Output: {}", output_dir.display());
    println!();

    let mut session = ChromiumSession::launch(site, !args.visible).await?;
    let result = crawl(&mut session, &credentials, strategy, &output_dir).await;

    if let Err(e) = session.close().await {
        warn!(error = %format!("{:#}", e), "Browser did not close cleanly");
    }

    let outcome = result?;
    print_outcome(&outcome);
    Ok(())
}

async fn crawl(
    session: &mut ChromiumSession,
    credentials: &Credentials,
    strategy: &Strategy,
    output_dir: &Path,
) -> Result<CrawlOutcome> {
    session.login(credentials).await?;

    let mut engine = TraversalEngine::new(session, output_dir);
    let outcome = engine
        .run(strategy)
        .await
        .with_context(|| format!("{} crawl failed", strategy.name()))?;
    Ok(outcome)
}

fn print_outcome(outcome: &CrawlOutcome) {
    let summary = &outcome.report.summary;

    println!();
    println!("Crawl complete (run {})", outcome.run_id);
    println!("  Extracted:  {}", summary.extracted_count);
    println!("  Failed:     {}", summary.failed_count);
    println!("  Processed:  {}", summary.total_processed);
    println!("  Log:        {}", outcome.report_path.display());
}

/// Print the crawl log counters and every stored diagram
async fn show_summary(output_dir: &Path) -> Result<()> {
    let report = load_report(output_dir).await?;

    println!("Output directory: {}", output_dir.display());
    println!();
    println!("Summary:");
    println!("  Extracted:  {}", report.summary.extracted_count);
    println!("  Failed:     {}", report.summary.failed_count);
    println!("  Processed:  {}", report.summary.total_processed);
    println!();

    let pattern = output_dir.join("**").join("*.svg");
    let pattern = pattern.to_string_lossy();

    let mut files: Vec<(PathBuf, u64)> = Vec::new();
    for entry in glob::glob(&pattern).context("Invalid output directory pattern")? {
        let path = entry.context("Failed to read output entry")?;
        let size = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();
        files.push((path, size));
    }
    files.sort();

    if files.is_empty() {
        println!("No diagrams found");
        return Ok(());
    }

    println!("{:<70} {:>10}", "FILE", "BYTES");
    println!("{}", "-".repeat(81));
    for (path, size) in &files {
        let shown = path.strip_prefix(output_dir).unwrap_or(path);
        println!("{:<70} {:>10}", shown.display(), size);
    }
    let total: u64 = files.iter().map(|(_, size)| size).sum();
    println!("{}", "-".repeat(81));
    println!("{} files, {} bytes", files.len(), total);

    Ok(())
}

/// Show resolved configuration as it is on disk now
fn show_config() -> Result<()> {
    let cfg = config::reload_config()?;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("  svgcrawl Configuration");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Output:      {}", cfg.output_dir.display());
    println!();
    println!("Site:");
    println!("  Base URL:          {}", display_or_unset(&cfg.site.base_url));
    println!(
        "  Login link:        {}",
        cfg.site.login_link_text.as_deref().unwrap_or("(none)")
    );
    println!("  Username input:    {}", cfg.site.username_selector);
    println!("  Password input:    {}", cfg.site.password_selector);
    println!("  Submit:            {}", cfg.site.submit_text);
    println!("  Ready marker:      {}", cfg.site.ready_link_text);
    println!(
        "  Chrome:            {}",
        cfg.site
            .chrome_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(auto-detect)".to_string())
    );
    println!();
    println!("Crawl:");
    println!("  Max pages:         {}", cfg.crawl.max_pages);
    println!("  Navigation timeout: {}s", cfg.crawl.navigation_timeout_seconds);
    println!("  Settle delay:      {}ms", cfg.crawl.settle_delay_ms);
    println!("  Library markers:   {}", cfg.crawl.library_markers.join(", "));
    println!("  Drill-down mode:   {}", cfg.crawl.drill_down_extraction);

    Ok(())
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}
