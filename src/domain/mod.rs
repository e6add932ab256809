//! Domain types for the svgcrawl engine.
//!
//! This module contains the core data structures:
//! - PageVisit: A page the engine landed on
//! - Artifact: A classified vector-graphic fragment
//! - LogEntry / RunReport: The per-run log and its persisted form

pub mod artifact;
pub mod page;
pub mod report;

// Re-export commonly used types
pub use artifact::{Artifact, ExtractionMode};
pub use page::{normalize_url, same_site, PageVisit};
pub use report::{LogEntry, PageStatus, RunReport, RunSummary};
