//! Run log entries and the persisted run report.
//!
//! The report is the only run state that outlives the run besides the
//! artifact files themselves. Its JSON shape is consumed by other tooling,
//! so field names here are part of the contract.

use serde::{Deserialize, Serialize};

/// Outcome of one log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// An artifact was written to disk
    Success,

    /// The page was visited but yielded no wanted artifact
    #[serde(rename = "no_svg")]
    NoContent,

    /// The page could not be reached, or an artifact could not be written
    Error,
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageStatus::Success => write!(f, "success"),
            PageStatus::NoContent => write!(f, "no_svg"),
            PageStatus::Error => write!(f, "error"),
        }
    }
}

/// One line of the run log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Section label the page was filed under
    pub section: String,

    /// Page title at visit time
    pub page_title: String,

    /// Breadcrumb trail joined with ` > `
    #[serde(rename = "breadcrumb")]
    pub breadcrumb_joined: String,

    /// Normalized page URL
    pub url: String,

    /// Written file, when there is one
    pub file_path: Option<String>,

    /// Size of the artifact markup in characters (0 without an artifact)
    #[serde(rename = "svg_size")]
    pub artifact_size: usize,

    /// Outcome
    pub status: PageStatus,
}

/// Aggregate counters for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Artifacts successfully written
    pub extracted_count: usize,

    /// Artifact writes that failed
    pub failed_count: usize,

    /// Log entries recorded
    pub total_processed: usize,
}

/// The persisted report: summary plus every log entry in visit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: RunSummary,

    #[serde(rename = "processes")]
    pub entries: Vec<LogEntry>,
}

impl RunReport {
    /// Freeze counters and entries into a report
    pub fn new(extracted_count: usize, failed_count: usize, entries: Vec<LogEntry>) -> Self {
        Self {
            summary: RunSummary {
                extracted_count,
                failed_count,
                total_processed: entries.len(),
            },
            entries,
        }
    }

    /// Number of entries with the given status
    pub fn count(&self, status: PageStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(status: PageStatus) -> LogEntry {
        LogEntry {
            section: "sitewide".to_string(),
            page_title: "Home".to_string(),
            breadcrumb_joined: "Home".to_string(),
            url: "https://site.test/".to_string(),
            file_path: None,
            artifact_size: 0,
            status,
        }
    }

    #[test]
    fn test_report_json_shape() {
        let report = RunReport::new(0, 0, vec![entry(PageStatus::NoContent)]);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["summary"]["total_processed"], 1);
        let first = &json["processes"][0];
        assert_eq!(first["status"], "no_svg");
        assert_eq!(first["svg_size"], 0);
        assert_eq!(first["breadcrumb"], "Home");
        assert!(first["file_path"].is_null());
    }

    #[test]
    fn test_total_processed_tracks_entries() {
        let report = RunReport::new(
            1,
            1,
            vec![
                entry(PageStatus::Success),
                entry(PageStatus::Error),
                entry(PageStatus::NoContent),
            ],
        );
        assert_eq!(report.summary.total_processed, 3);
        assert_eq!(report.count(PageStatus::Success), 1);
        assert_eq!(report.count(PageStatus::Error), 1);
    }

    #[test]
    fn test_status_roundtrip_names() {
        let parsed: PageStatus = serde_json::from_str("\"no_svg\"").unwrap();
        assert_eq!(parsed, PageStatus::NoContent);
        assert_eq!(PageStatus::Success.to_string(), "success");
    }
}
