//! Traversal engine.
//!
//! Drives one logged-in [`BrowsingSession`] through a [`Strategy`]. Pages are
//! handled strictly one at a time: navigate, classify every fragment, store
//! the wanted ones, discover further links, and only then move on.
//!
//! Failures on a single page are logged against that page and traversal
//! continues. Nothing is retried.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::adapters::{BrowsingSession, ElementHandle, Target};
use crate::domain::{normalize_url, ExtractionMode, LogEntry, PageStatus, PageVisit, RunReport};

use super::classifier::extract_artifacts;
use super::error::CrawlError;
use super::frontier::Frontier;
use super::reporter::write_report;
use super::resolver::{resolve_page, ROOT_SECTION};
use super::store::{sanitize_segment, ArtifactStore};
use super::strategy::{BreadthFirst, DrillDown, SectionNaming, Seed, Strategy, DIRECT_SECTION};

/// Pulls the serialized markup of every `<svg>` in the live DOM
pub const COLLECT_FRAGMENTS_SCRIPT: &str =
    "() => Array.from(document.querySelectorAll('svg')).map(svg => svg.outerHTML)";

/// Generic clickables inspected when no numbered section heading is found
const FALLBACK_SCAN_LIMIT: usize = 10;

/// "3. Transactional Processes"
fn section_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\s+.*Processes$").expect("valid regex"))
}

/// How a visited page is filed
enum Filing<'a> {
    /// One fixed section label for every page
    Bucket(&'a str),

    /// Section resolved from the page's breadcrumb
    Breadcrumb,
}

impl Filing<'_> {
    fn from_naming(naming: &SectionNaming) -> Filing<'_> {
        match naming {
            SectionNaming::Fixed(label) => Filing::Bucket(label),
            SectionNaming::Breadcrumb => Filing::Breadcrumb,
        }
    }

    /// Section label for the log, and folder relative to the output root
    fn place(&self, visit: &PageVisit) -> (String, PathBuf) {
        match self {
            Filing::Bucket(label) => (label.to_string(), PathBuf::from(sanitize_segment(label))),
            Filing::Breadcrumb => {
                let path = resolve_page(&visit.breadcrumb);
                let dir = path.relative_dir();
                (path.section, dir)
            }
        }
    }

    /// Section label for a page that was never reached
    fn unreached_label(&self) -> &str {
        match self {
            Filing::Bucket(label) => *label,
            Filing::Breadcrumb => ROOT_SECTION,
        }
    }
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub run_id: Uuid,
    pub report: RunReport,
    pub report_path: PathBuf,
}

/// Owns all per-run state: the artifact store, its counters and the run log
pub struct TraversalEngine<'s, S: BrowsingSession + ?Sized> {
    session: &'s mut S,
    store: ArtifactStore,
    log: Vec<LogEntry>,
    run_id: Uuid,
}

impl<'s, S: BrowsingSession + ?Sized> TraversalEngine<'s, S> {
    /// Create an engine over an established session
    pub fn new(session: &'s mut S, output_root: impl Into<PathBuf>) -> Self {
        Self {
            session,
            store: ArtifactStore::new(output_root),
            log: Vec::new(),
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Log entries recorded so far
    pub fn entries(&self) -> &[LogEntry] {
        &self.log
    }

    /// Execute a strategy and write the run report
    #[instrument(skip(self, strategy), fields(run_id = %self.run_id, strategy = strategy.name()))]
    pub async fn run(&mut self, strategy: &Strategy) -> Result<CrawlOutcome, CrawlError> {
        info!(session = self.session.name(), "Starting crawl");

        match strategy {
            Strategy::DrillDown(plan) => self.drill_down(plan).await?,
            Strategy::BreadthFirst(plan) => self.breadth_first(plan).await?,
            Strategy::Direct { url, extraction } => self.direct(url, *extraction).await?,
        }

        self.finish().await
    }

    async fn finish(&mut self) -> Result<CrawlOutcome, CrawlError> {
        let report = RunReport::new(
            self.store.extracted_count(),
            self.store.failed_count(),
            std::mem::take(&mut self.log),
        );
        let report_path = write_report(&report, self.store.root()).await?;

        info!(
            extracted = report.summary.extracted_count,
            failed = report.summary.failed_count,
            processed = report.summary.total_processed,
            "Crawl completed"
        );

        Ok(CrawlOutcome {
            run_id: self.run_id,
            report,
            report_path,
        })
    }

    // ------------------------------------------------------------------
    // Strategy A: section -> process drill-down
    // ------------------------------------------------------------------

    async fn drill_down(&mut self, plan: &DrillDown) -> Result<(), CrawlError> {
        let library_url = self.enter_library().await?;

        let mut sections = self.find_sections(&library_url).await?;
        if let Some(max) = plan.max_sections {
            sections.truncate(max);
        }
        info!(count = sections.len(), "Found main sections");

        let total = sections.len();
        for (i, section) in sections.iter().enumerate() {
            info!(section = %section.text, "Crawling section {}/{}", i + 1, total);

            if let Err(e) = self.crawl_section(section, &library_url, plan).await {
                warn!(section = %section.text, error = %e, "Section failed, skipping");
                let url = section.href.clone().unwrap_or_else(|| library_url.clone());
                self.record_unreached(&url, &section.text);
            }
        }

        Ok(())
    }

    async fn crawl_section(
        &mut self,
        section: &ElementHandle,
        library_url: &str,
        plan: &DrillDown,
    ) -> Result<(), CrawlError> {
        self.activate(section, library_url).await?;

        let filing = Filing::Bucket(&section.text);
        let overview = self.harvest(&filing, plan.extraction).await?;
        let section_url = overview.url;

        let mut links = self
            .session
            .find_clickable(Target::ProcessLinks)
            .await
            .map_err(|e| CrawlError::extraction(&section_url, e))?;
        if let Some(max) = plan.max_processes {
            links.truncate(max);
        }
        info!(count = links.len(), "Found processes in section");

        let total = links.len();
        for (i, link) in links.iter().enumerate() {
            debug!(link = %link.text, "Processing {}/{}", i + 1, total);

            let result = match self.activate(link, &section_url).await {
                Ok(()) => self.harvest(&filing, plan.extraction).await.map(|_| ()),
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                warn!(link = %link.text, error = %e, "Process page failed, skipping");
                let url = link.href.clone().unwrap_or_else(|| section_url.clone());
                self.record_unreached(&url, &section.text);
            }
        }

        Ok(())
    }

    /// Click the library entry point and return the URL it lands on
    async fn enter_library(&mut self) -> Result<String, CrawlError> {
        let here = self.current_url_or_blank().await;

        let entries = self
            .session
            .find_clickable(Target::LibraryEntry)
            .await
            .map_err(|e| CrawlError::navigation(&here, e))?;
        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| CrawlError::navigation(&here, "library entry point not found"))?;

        self.activate(&entry, &here).await?;

        let library_url = self
            .session
            .current_url()
            .await
            .map_err(|e| CrawlError::navigation(&here, e))?;
        info!(url = %library_url, "Entered library");
        Ok(library_url)
    }

    /// Numbered "... Processes" headings, falling back to any of the first
    /// few clickables that mention a process or section.
    async fn find_sections(&mut self, library_url: &str) -> Result<Vec<ElementHandle>, CrawlError> {
        let headings = match self.session.find_clickable(Target::SectionHeadings).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Section heading lookup failed");
                Vec::new()
            }
        };

        let sections: Vec<ElementHandle> = headings
            .into_iter()
            .filter(|h| section_heading().is_match(&h.text))
            .collect();
        if !sections.is_empty() {
            return Ok(sections);
        }

        debug!("No numbered sections, scanning generic clickables");
        let clickables = match self.session.find_clickable(Target::GenericClickables).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Clickable lookup failed");
                Vec::new()
            }
        };

        let fallback: Vec<ElementHandle> = clickables
            .into_iter()
            .take(FALLBACK_SCAN_LIMIT)
            .filter(|h| {
                let text = h.text.to_lowercase();
                text.contains("process") || text.contains("section")
            })
            .collect();

        if fallback.is_empty() {
            return Err(CrawlError::NoSections {
                url: library_url.to_string(),
            });
        }
        Ok(fallback)
    }

    /// Activate a handle captured earlier.
    ///
    /// Links are followed by URL. Anything else is clicked on `origin`, found
    /// again by its enumeration index and confirmed by exact text; if the
    /// index moved, the first element with the same text is used instead.
    async fn activate(&mut self, handle: &ElementHandle, origin: &str) -> Result<(), CrawlError> {
        if let Some(ref href) = handle.href {
            return self
                .session
                .navigate(href)
                .await
                .map_err(|e| CrawlError::navigation(href, e));
        }

        let here = self.current_url_or_blank().await;
        if !same_page(&here, origin) {
            self.session
                .navigate(origin)
                .await
                .map_err(|e| CrawlError::navigation(origin, e))?;
        }

        let candidates = self
            .session
            .find_clickable(handle.target)
            .await
            .map_err(|e| CrawlError::navigation(origin, e))?;

        let found = candidates
            .iter()
            .find(|c| c.index == handle.index && c.text == handle.text)
            .or_else(|| candidates.iter().find(|c| c.text == handle.text))
            .ok_or_else(|| {
                CrawlError::navigation(origin, format!("'{}' is no longer on the page", handle.text))
            })?;

        self.session
            .click(found)
            .await
            .map_err(|e| CrawlError::navigation(origin, e))
    }

    // ------------------------------------------------------------------
    // Strategies B and C: budgeted breadth-first crawl
    // ------------------------------------------------------------------

    async fn breadth_first(&mut self, plan: &BreadthFirst) -> Result<(), CrawlError> {
        let seed_raw = match plan.seed {
            Seed::CurrentPage => self
                .session
                .current_url()
                .await
                .map_err(|e| CrawlError::Session(format!("{:#}", e)))?,
            Seed::LibraryEntry => self.enter_library().await?,
        };
        let seed = normalize_url(&seed_raw, None)
            .ok_or_else(|| CrawlError::navigation(&seed_raw, "seed is not an http(s) URL"))?;

        let filing = Filing::from_naming(&plan.naming);
        let mut frontier = Frontier::seeded(seed.as_str());

        while frontier.visited_count() < plan.max_pages {
            let Some(url) = frontier.next_unvisited() else {
                break;
            };

            if let Err(e) = self.session.navigate(&url).await {
                warn!(url = %url, error = %format!("{:#}", e), "Error visiting page");
                self.record_unreached(&url, filing.unreached_label());
                continue;
            }

            let visit = match self.harvest(&filing, plan.extraction).await {
                Ok(visit) => visit,
                Err(e) => {
                    warn!(url = %url, error = %e, "Error visiting page");
                    self.record_unreached(&url, filing.unreached_label());
                    continue;
                }
            };
            if visit.url != url {
                debug!(requested = %url, landed = %visit.url, "Redirected");
                frontier.mark_visited(&visit.url);
            }

            let links = match self.session.find_links().await {
                Ok(links) => links,
                Err(e) => {
                    warn!(url = %visit.url, error = %format!("{:#}", e), "Link discovery failed");
                    Vec::new()
                }
            };

            let base = Url::parse(&visit.url).ok();
            let mut admitted = 0usize;
            for href in links {
                let Some(candidate) = normalize_url(&href, base.as_ref()) else {
                    continue;
                };
                let prefix = frontier.last_enqueued().unwrap_or(&visit.url).to_string();
                if plan.scope.admits(&candidate, &seed, &prefix) && frontier.enqueue(candidate.as_str()) {
                    admitted += 1;
                }
            }

            info!(
                visited = frontier.visited_count(),
                queued = frontier.pending(),
                admitted,
                "Crawl progress"
            );
        }

        if !frontier.is_empty() {
            info!(
                remaining = frontier.pending(),
                max_pages = plan.max_pages,
                "Page budget reached"
            );
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Single page
    // ------------------------------------------------------------------

    async fn direct(&mut self, url: &str, extraction: ExtractionMode) -> Result<(), CrawlError> {
        self.session
            .navigate(url)
            .await
            .map_err(|e| CrawlError::navigation(url, e))?;
        self.harvest(&Filing::Bucket(DIRECT_SECTION), extraction).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shared page handling
    // ------------------------------------------------------------------

    /// Classify and store the fragments on the current page, logging one
    /// entry per stored artifact or a single `no_svg` entry.
    async fn harvest(
        &mut self,
        filing: &Filing<'_>,
        extraction: ExtractionMode,
    ) -> Result<PageVisit, CrawlError> {
        let visit = self.capture_page().await?;

        let fragments = match self.collect_fragments(&visit.url).await {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(error = %e, "Treating page as having no content");
                Vec::new()
            }
        };

        let found = fragments.len();
        let wanted: Vec<_> = extract_artifacts(fragments, extraction)
            .into_iter()
            .filter(|a| a.is_wanted)
            .collect();
        let (section, folder) = filing.place(&visit);

        debug!(
            title = %visit.title,
            found,
            wanted = wanted.len(),
            ignored = found.saturating_sub(wanted.len()),
            "Classified fragments"
        );

        if wanted.is_empty() {
            info!(title = %visit.title, "No diagram found");
            self.record(&visit, &section, None, 0, PageStatus::NoContent);
            return Ok(visit);
        }

        for artifact in wanted {
            let size = artifact.size();
            match self
                .store
                .save(&artifact.raw_markup, &folder, &visit.title)
                .await
            {
                Ok(path) => {
                    info!(path = %path.display(), "Saved diagram");
                    let path = path.to_string_lossy().into_owned();
                    self.record(&visit, &section, Some(path), size, PageStatus::Success);
                }
                Err(_) => {
                    self.record(&visit, &section, None, size, PageStatus::Error);
                }
            }
        }

        Ok(visit)
    }

    async fn capture_page(&mut self) -> Result<PageVisit, CrawlError> {
        let url = self
            .session
            .current_url()
            .await
            .map_err(|e| CrawlError::extraction("<current page>", e))?;

        let title = match self.session.current_title().await {
            Ok(title) => title,
            Err(e) => {
                debug!(url = %url, error = %format!("{:#}", e), "No page title");
                String::new()
            }
        };

        let breadcrumb = match self.session.find_breadcrumb_elements().await {
            Ok(trail) => trail,
            Err(e) => {
                debug!(url = %url, error = %format!("{:#}", e), "No breadcrumb");
                Vec::new()
            }
        };

        Ok(PageVisit::new(&url, title, breadcrumb))
    }

    async fn collect_fragments(&mut self, url: &str) -> Result<Vec<String>, CrawlError> {
        let value = self
            .session
            .execute_script(COLLECT_FRAGMENTS_SCRIPT)
            .await
            .map_err(|e| CrawlError::extraction(url, e))?;

        if value.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|e| CrawlError::extraction(url, e))
    }

    async fn current_url_or_blank(&mut self) -> String {
        self.session.current_url().await.unwrap_or_default()
    }

    fn record(
        &mut self,
        visit: &PageVisit,
        section: &str,
        file_path: Option<String>,
        artifact_size: usize,
        status: PageStatus,
    ) {
        self.log.push(LogEntry {
            section: section.to_string(),
            page_title: visit.title.clone(),
            breadcrumb_joined: visit.breadcrumb_joined(),
            url: visit.url.clone(),
            file_path,
            artifact_size,
            status,
        });
    }

    /// Log a page that could not be reached or processed
    fn record_unreached(&mut self, url: &str, section: &str) {
        let visit = PageVisit::new(url, String::new(), Vec::new());
        self.record(&visit, section, None, 0, PageStatus::Error);
    }
}

/// Whether two URLs name the same page once normalized
fn same_page(a: &str, b: &str) -> bool {
    match (normalize_url(a, None), normalize_url(b, None)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_heading_pattern() {
        assert!(section_heading().is_match("0. Customer Relationship Management Processes"));
        assert!(section_heading().is_match("15. Fund Accounting Processes"));
        assert!(!section_heading().is_match("3.4 Clearing and RTGS Processes"));
        assert!(!section_heading().is_match("1. Retail Banking"));
    }

    #[test]
    fn test_same_page_ignores_fragment() {
        assert!(same_page("https://site.test/Library#top", "https://site.test/Library"));
        assert!(!same_page("https://site.test/Library", "https://site.test/Home"));
        assert!(same_page("", ""));
    }

    #[test]
    fn test_breadcrumb_filing() {
        let visit = PageVisit::new(
            "https://site.test/Content/Index/1",
            "Clearing",
            vec![
                "Library".to_string(),
                "3. Transactional Processes".to_string(),
                "3.4 Clearing and RTGS Processes".to_string(),
            ],
        );
        let (section, folder) = Filing::Breadcrumb.place(&visit);
        assert_eq!(section, "3_Transactional_Processes");
        assert_eq!(
            folder,
            PathBuf::from("3_Transactional_Processes").join("3.4_Clearing_and_RTGS_Processes")
        );

        let (section, folder) = Filing::Bucket("1. Retail Banking Processes").place(&visit);
        assert_eq!(section, "1. Retail Banking Processes");
        assert_eq!(folder, PathBuf::from("1._Retail_Banking_Processes"));
    }
}
