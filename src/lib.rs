//! svgcrawl - SVG diagram extraction from an authenticated hierarchical site
//!
//! Logs in to a content portal with a real browser, walks its library tree,
//! and files every process diagram it finds under a folder derived from the
//! page's breadcrumb.
//!
//! # Architecture
//!
//! One traversal loop drives every strategy:
//! - Visit a page, then classify each SVG fragment as diagram or decoration
//! - Store the diagrams under a sanitized section folder
//! - Discover further links (breadth-first) or drill into sections
//! - Record one log entry per outcome and write a JSON run report at the end
//!
//! # Modules
//!
//! - `adapters`: Browsing session interface and the Chromium session
//! - `core`: Resolver, classifier, store, frontier, strategies, engine, reporter
//! - `domain`: Data structures (PageVisit, Artifact, RunReport)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Try a site out with a capped drill-down
//! svgcrawl crawl --mode sample -u alice -p secret
//!
//! # Walk the whole library, filing by breadcrumb
//! svgcrawl crawl --mode library-recursive
//!
//! # Summarize what was extracted
//! svgcrawl summary
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{BrowsingSession, ChromiumSession, Credentials, ElementHandle, SiteProfile, Target};
pub use core::{CrawlError, CrawlOutcome, Strategy, TraversalEngine};
pub use domain::{Artifact, ExtractionMode, LogEntry, PageStatus, PageVisit, RunReport, RunSummary};
