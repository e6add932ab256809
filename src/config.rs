//! Configuration for svgcrawl.
//!
//! Configuration sources (highest priority first):
//! 1. CLI flags (applied by the caller on top of the resolved config)
//! 2. Environment variables (SVGCRAWL_BASE_URL, SVGCRAWL_OUTPUT_DIR)
//! 3. Config file (.svgcrawl/config.yaml)
//! 4. Defaults (./svg_output)
//!
//! Config file discovery:
//! - Searches current directory and parents for .svgcrawl/config.yaml
//! - Paths in config file are relative to the project root (parent of .svgcrawl/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::SiteProfile;
use crate::core::{library_markers, DEFAULT_MAX_PAGES};
use crate::domain::ExtractionMode;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".svgcrawl";
const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_OUTPUT_DIR: &str = "svg_output";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    pub base_url: Option<String>,
    pub login_link_text: Option<String>,
    pub username_selector: Option<String>,
    pub password_selector: Option<String>,
    pub submit_text: Option<String>,
    pub ready_link_text: Option<String>,
    /// Chrome binary (relative to project root)
    pub chrome_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlConfig {
    pub max_pages: Option<usize>,
    pub navigation_timeout_seconds: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub library_markers: Option<Vec<String>>,
    pub drill_down_extraction: Option<ExtractionMode>,
}

/// Crawl tuning after defaults are applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSettings {
    pub max_pages: usize,
    pub navigation_timeout_seconds: u64,
    pub settle_delay_ms: u64,
    pub library_markers: Vec<String>,
    pub drill_down_extraction: ExtractionMode,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            navigation_timeout_seconds: 20,
            settle_delay_ms: 2000,
            library_markers: library_markers(),
            drill_down_extraction: ExtractionMode::Structural,
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Output root for artifacts and the crawl log
    pub output_dir: PathBuf,
    /// Site login profile
    pub site: SiteProfile,
    /// Crawl settings
    pub crawl: CrawlSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching a directory and its parents
fn find_config_file_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Apply a parsed config file on top of the defaults
fn apply_file(config: ConfigFile, base_dir: &Path) -> (Option<PathBuf>, SiteProfile, CrawlSettings) {
    let defaults = CrawlSettings::default();
    let crawl = CrawlSettings {
        max_pages: config.crawl.max_pages.unwrap_or(defaults.max_pages),
        navigation_timeout_seconds: config
            .crawl
            .navigation_timeout_seconds
            .unwrap_or(defaults.navigation_timeout_seconds),
        settle_delay_ms: config.crawl.settle_delay_ms.unwrap_or(defaults.settle_delay_ms),
        library_markers: config
            .crawl
            .library_markers
            .unwrap_or(defaults.library_markers),
        drill_down_extraction: config
            .crawl
            .drill_down_extraction
            .unwrap_or(defaults.drill_down_extraction),
    };

    let mut site = SiteProfile::default();
    let s = config.site;
    if let Some(v) = s.base_url {
        site.base_url = v;
    }
    if s.login_link_text.is_some() {
        site.login_link_text = s.login_link_text.filter(|t| !t.is_empty());
    }
    if let Some(v) = s.username_selector {
        site.username_selector = v;
    }
    if let Some(v) = s.password_selector {
        site.password_selector = v;
    }
    if let Some(v) = s.submit_text {
        site.submit_text = v;
    }
    if let Some(v) = s.ready_link_text {
        site.ready_link_text = v;
    }
    site.chrome_path = s.chrome_path.map(|p| resolve_path(base_dir, &p));

    let output_dir = config.output_dir.map(|p| resolve_path(base_dir, &p));
    (output_dir, site, crawl)
}

/// Load configuration from all sources, searching from `start`
fn load_config_from(start: &Path) -> Result<ResolvedConfig> {
    let config_file = find_config_file_from(start);

    let (file_output, mut site, crawl) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // Base directory is the parent of .svgcrawl/ (i.e., grandparent of config.yaml)
        let base_dir = config_path
            .parent() // .svgcrawl/
            .and_then(|p| p.parent()) // project root
            .unwrap_or(Path::new("."));

        apply_file(config, base_dir)
    } else {
        (None, SiteProfile::default(), CrawlSettings::default())
    };

    let output_dir = if let Ok(env_out) = std::env::var("SVGCRAWL_OUTPUT_DIR") {
        PathBuf::from(env_out)
    } else if let Some(dir) = file_output {
        dir
    } else {
        start.join(DEFAULT_OUTPUT_DIR)
    };

    if let Ok(env_url) = std::env::var("SVGCRAWL_BASE_URL") {
        site.base_url = env_url;
    }
    if site.chrome_path.is_none() {
        site.chrome_path = user_chrome_dir()
            .map(|dir| dir.join("chrome"))
            .filter(|path| path.exists());
    }
    site.navigation_timeout = Duration::from_secs(crawl.navigation_timeout_seconds);
    site.settle_delay = Duration::from_millis(crawl.settle_delay_ms);

    Ok(ResolvedConfig {
        output_dir,
        site,
        crawl,
        config_file,
    })
}

fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_from(&cwd)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Load configuration afresh, bypassing the process-wide cache
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// User-wide Chrome download directory (~/.svgcrawl/chromium)
pub fn user_chrome_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join("chromium"))
}
