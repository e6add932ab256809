//! Traversal strategy descriptors.
//!
//! Every strategy runs through the same engine loop (visit, classify, store,
//! discover). A descriptor only says where to start, which links to follow,
//! how to name output folders, and how to extract fragments.

use url::Url;

use crate::domain::{same_site, ExtractionMode};

/// Section bucket for pages found by the sitewide crawl
pub const SITEWIDE_SECTION: &str = "sitewide";

/// Section bucket for single-page extraction
pub const DIRECT_SECTION: &str = "direct";

/// Visited-page ceiling when none is given
pub const DEFAULT_MAX_PAGES: usize = 1000;

fn default_library_markers() -> Vec<String> {
    vec!["/Library".to_string(), "/Content/".to_string()]
}

/// Bounded section → process drill-down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillDown {
    /// Sections to visit (all when unset)
    pub max_sections: Option<usize>,

    /// Process links to follow per section (all when unset)
    pub max_processes: Option<usize>,

    pub extraction: ExtractionMode,
}

impl DrillDown {
    /// Capped drill-down for trying a site out
    pub fn sample(max_sections: usize, max_processes: usize) -> Self {
        Self {
            max_sections: Some(max_sections),
            max_processes: Some(max_processes),
            extraction: ExtractionMode::Structural,
        }
    }

    /// Uncapped drill-down over every section and process
    pub fn full() -> Self {
        Self {
            max_sections: None,
            max_processes: None,
            extraction: ExtractionMode::Structural,
        }
    }

    pub fn with_extraction(mut self, extraction: ExtractionMode) -> Self {
        self.extraction = extraction;
        self
    }
}

/// Where a breadth-first crawl starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// The page the session is on after login
    CurrentPage,

    /// The page reached by activating the library entry point
    LibraryEntry,
}

/// Which discovered links a breadth-first crawl follows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkScope {
    /// Any link on the seed's host
    SameSite,

    /// Links on the seed's host whose path contains a content-area marker,
    /// or that extend the most recently queued URL
    Library { markers: Vec<String> },
}

impl LinkScope {
    /// Decide whether `candidate` may be queued.
    ///
    /// `prefix` is the most recently queued URL, or the current page when
    /// nothing has been queued yet.
    pub fn admits(&self, candidate: &Url, seed: &Url, prefix: &str) -> bool {
        if !same_site(candidate, seed) {
            return false;
        }

        match self {
            LinkScope::SameSite => true,
            LinkScope::Library { markers } => {
                let path = candidate.path();
                markers.iter().any(|m| path.contains(m.as_str()))
                    || candidate.as_str().starts_with(prefix)
            }
        }
    }
}

/// How a visited page's output folder is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionNaming {
    /// Every page goes in one bucket
    Fixed(String),

    /// Folder resolved from the page's live breadcrumb
    Breadcrumb,
}

/// Budgeted breadth-first crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadthFirst {
    pub seed: Seed,
    pub scope: LinkScope,
    pub naming: SectionNaming,
    pub extraction: ExtractionMode,

    /// Visited-page ceiling
    pub max_pages: usize,
}

impl BreadthFirst {
    /// Crawl every same-site page reachable from the post-login page
    pub fn sitewide(max_pages: usize) -> Self {
        Self {
            seed: Seed::CurrentPage,
            scope: LinkScope::SameSite,
            naming: SectionNaming::Fixed(SITEWIDE_SECTION.to_string()),
            extraction: ExtractionMode::Structural,
            max_pages,
        }
    }

    /// Crawl the library content tree, filing pages by breadcrumb
    pub fn library(max_pages: usize, markers: Vec<String>) -> Self {
        Self {
            seed: Seed::LibraryEntry,
            scope: LinkScope::Library { markers },
            naming: SectionNaming::Breadcrumb,
            extraction: ExtractionMode::Structural,
            max_pages,
        }
    }
}

impl Default for BreadthFirst {
    fn default() -> Self {
        Self::library(DEFAULT_MAX_PAGES, default_library_markers())
    }
}

/// A complete traversal strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    DrillDown(DrillDown),
    BreadthFirst(BreadthFirst),

    /// One known page, no link discovery
    Direct {
        url: String,
        extraction: ExtractionMode,
    },
}

impl Strategy {
    /// Single-page extraction using the largest-fragment rule
    pub fn direct(url: impl Into<String>) -> Self {
        Strategy::Direct {
            url: url.into(),
            extraction: ExtractionMode::Largest,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::DrillDown(_) => "drill_down",
            Strategy::BreadthFirst(bfs) => match bfs.seed {
                Seed::CurrentPage => "sitewide",
                Seed::LibraryEntry => "library",
            },
            Strategy::Direct { .. } => "direct",
        }
    }
}

/// Library content-area markers used when none are configured
pub fn library_markers() -> Vec<String> {
    default_library_markers()
}
