//! Failure taxonomy for a crawl run.
//!
//! Only `Session` and `NoSections` end a run. Everything else is recorded
//! against the page or artifact it concerns and traversal carries on.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while crawling
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Browsing session could not be established: {0}")]
    Session(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Extraction failed on {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("Failed to write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No top-level sections found on {url}")]
    NoSections { url: String },

    #[error("Failed to write run report {}: {reason}", path.display())]
    Report { path: PathBuf, reason: String },
}

impl CrawlError {
    /// Whether this error ends the run rather than a single page
    pub fn is_fatal(&self) -> bool {
        matches!(self, CrawlError::Session(_) | CrawlError::NoSections { .. })
    }

    pub(crate) fn navigation(url: &str, err: impl std::fmt::Display) -> Self {
        CrawlError::Navigation {
            url: url.to_string(),
            reason: format!("{:#}", err),
        }
    }

    pub(crate) fn extraction(url: &str, err: impl std::fmt::Display) -> Self {
        CrawlError::Extraction {
            url: url.to_string(),
            reason: format!("{:#}", err),
        }
    }
}
