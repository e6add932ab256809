//! Run report persistence.
//!
//! The report is written once, at the end of a strategy, to
//! `<output_root>/crawl_log.json`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;
use tracing::info;

use crate::domain::RunReport;

use super::error::CrawlError;

/// Report file name inside the output root
pub const REPORT_FILE: &str = "crawl_log.json";

/// Path of the report for an output root
pub fn report_path(root: &Path) -> PathBuf {
    root.join(REPORT_FILE)
}

/// Write the report, replacing any previous one atomically
pub async fn write_report(report: &RunReport, root: &Path) -> Result<PathBuf, CrawlError> {
    let path = report_path(root);
    let json = serde_json::to_string_pretty(report).map_err(|e| CrawlError::Report {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let root = root.to_path_buf();
    let target = path.clone();
    let result = tokio::task::spawn_blocking(move || persist(&root, &target, json.as_bytes()))
        .await
        .map_err(anyhow::Error::from)
        .and_then(|r| r);

    match result {
        Ok(()) => {
            info!(
                path = %path.display(),
                extracted = report.summary.extracted_count,
                failed = report.summary.failed_count,
                total = report.summary.total_processed,
                "Crawl log saved"
            );
            Ok(path)
        }
        Err(e) => Err(CrawlError::Report {
            path,
            reason: format!("{:#}", e),
        }),
    }
}

fn persist(root: &Path, target: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::create_dir_all(root)
        .with_context(|| format!("Failed to create output root: {}", root.display()))?;

    let mut tmp = NamedTempFile::new_in(root).context("Failed to create temporary report file")?;
    tmp.write_all(bytes).context("Failed to write report")?;
    tmp.flush().context("Failed to flush report")?;
    tmp.persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to move report into place: {}", target.display()))?;
    Ok(())
}

/// Load a previously written report
pub async fn load_report(root: &Path) -> anyhow::Result<RunReport> {
    let path = report_path(root);
    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read crawl log: {}", path.display()))?;

    serde_json::from_str(&content).context("Failed to parse crawl log JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LogEntry, PageStatus};
    use tempfile::TempDir;

    fn sample_report() -> RunReport {
        RunReport::new(
            1,
            0,
            vec![LogEntry {
                section: "0. Customer Relationship Management Processes".to_string(),
                page_title: "Créer un compte".to_string(),
                breadcrumb_joined: "Library > 0. Customer Relationship Management Processes"
                    .to_string(),
                url: "https://site.test/Content/Index/1".to_string(),
                file_path: Some("out/0_CRM/Créer_un_compte.svg".to_string()),
                artifact_size: 2048,
                status: PageStatus::Success,
            }],
        )
    }

    #[tokio::test]
    async fn test_write_then_load() {
        let temp = TempDir::new().unwrap();
        let report = sample_report();

        let path = write_report(&report, temp.path()).await.unwrap();
        assert_eq!(path, temp.path().join(REPORT_FILE));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Créer un compte"), "non-ASCII kept verbatim");

        let loaded = load_report(temp.path()).await.unwrap();
        assert_eq!(loaded, report);
    }

    #[tokio::test]
    async fn test_rewrite_replaces_previous_report() {
        let temp = TempDir::new().unwrap();
        write_report(&sample_report(), temp.path()).await.unwrap();

        let empty = RunReport::new(0, 0, Vec::new());
        write_report(&empty, temp.path()).await.unwrap();

        let loaded = load_report(temp.path()).await.unwrap();
        assert_eq!(loaded.summary.total_processed, 0);
        // Only the report itself is left behind.
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_missing_report() {
        let temp = TempDir::new().unwrap();
        assert!(load_report(temp.path()).await.is_err());
    }
}
