//! Core crawl logic.
//!
//! This module contains:
//! - Resolver: breadcrumb to output folder mapping
//! - Classifier: diagram detection over raw SVG markup
//! - Store: sanitized, idempotent artifact writes
//! - Frontier: breadth-first queue with visited tracking
//! - Strategy: traversal descriptors
//! - Engine: the traversal loop shared by every strategy
//! - Reporter: run report persistence

pub mod classifier;
pub mod engine;
pub mod error;
pub mod frontier;
pub mod reporter;
pub mod resolver;
pub mod store;
pub mod strategy;

// Re-export commonly used types
pub use classifier::{classify, extract_artifacts, measure, SvgShape};
pub use engine::{CrawlOutcome, TraversalEngine, COLLECT_FRAGMENTS_SCRIPT};
pub use error::CrawlError;
pub use frontier::Frontier;
pub use reporter::{load_report, report_path, write_report, REPORT_FILE};
pub use resolver::{resolve, resolve_page, SectionPath, ROOT_SECTION};
pub use store::{sanitize_filename, sanitize_segment, ArtifactStore};
pub use strategy::{
    library_markers, BreadthFirst, DrillDown, LinkScope, SectionNaming, Seed, Strategy,
    DEFAULT_MAX_PAGES, DIRECT_SECTION, SITEWIDE_SECTION,
};
