//! On-disk artifact storage.
//!
//! Artifacts are written under `<output_root>/<section>[/<subsection>]/`.
//! A save to an existing path overwrites it; there is no versioning.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tokio::fs;
use tracing::{debug, warn};

use super::error::CrawlError;

/// Extension every stored artifact carries
pub const ARTIFACT_EXTENSION: &str = ".svg";

/// Longest sanitized name, in characters
pub const MAX_NAME_CHARS: usize = 200;

/// Name used when sanitization leaves nothing behind
const FALLBACK_NAME: &str = "untitled";

fn illegal_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Make a string safe to use as a single path component.
///
/// Illegal characters and whitespace runs become underscores, leading and
/// trailing underscores and periods are trimmed, and the result is cut to
/// [`MAX_NAME_CHARS`].
pub fn sanitize(name: &str) -> String {
    let replaced = illegal_chars().replace_all(name, "_");
    let replaced = whitespace_runs().replace_all(&replaced, "_");
    let trimmed = replaced.trim_matches(|c| c == '_' || c == '.');
    let truncated: String = trimmed.chars().take(MAX_NAME_CHARS).collect();
    // Truncation can expose a trailing separator again.
    truncated.trim_end_matches(|c| c == '_' || c == '.').to_string()
}

/// Sanitize a folder segment, never returning an empty name
pub fn sanitize_segment(name: &str) -> String {
    let cleaned = sanitize(name);
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

/// Sanitize a file name and make sure it ends in `.svg`
pub fn sanitize_filename(name: &str) -> String {
    let mut cleaned = sanitize_segment(name);
    if !cleaned.to_lowercase().ends_with(ARTIFACT_EXTENSION) {
        cleaned.push_str(ARTIFACT_EXTENSION);
    }
    cleaned
}

/// Writes artifacts below an output root and counts the outcomes
#[derive(Debug)]
pub struct ArtifactStore {
    /// Output root directory
    root: PathBuf,

    /// Successful writes
    extracted_count: usize,

    /// Failed writes
    failed_count: usize,
}

impl ArtifactStore {
    /// Create a store rooted at `root` (created lazily on first save)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extracted_count: 0,
            failed_count: 0,
        }
    }

    /// Output root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Successful writes so far
    pub fn extracted_count(&self) -> usize {
        self.extracted_count
    }

    /// Failed writes so far
    pub fn failed_count(&self) -> usize {
        self.failed_count
    }

    /// Write `markup` to `<root>/<folder>/<sanitized filename>`.
    ///
    /// Missing directories are created first. Any I/O failure is counted and
    /// returned as [`CrawlError::Storage`]; callers treat it as non-fatal.
    pub async fn save(
        &mut self,
        markup: &str,
        folder: &Path,
        filename: &str,
    ) -> Result<PathBuf, CrawlError> {
        let dir = self.root.join(folder);
        let path = dir.join(sanitize_filename(filename));

        match write_file(&dir, &path, markup).await {
            Ok(()) => {
                self.extracted_count += 1;
                debug!(path = %path.display(), bytes = markup.len(), "Saved artifact");
                Ok(path)
            }
            Err(source) => {
                self.failed_count += 1;
                warn!(path = %path.display(), error = %source, "Failed to save artifact");
                Err(CrawlError::Storage { path, source })
            }
        }
    }
}

async fn write_file(dir: &Path, path: &Path, content: &str) -> std::io::Result<()> {
    fs::create_dir_all(dir).await?;
    fs::write(path, content).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_replaces_illegal_characters() {
        let name = sanitize("Some/Bad:Name?.svg");
        assert_eq!(name, "Some_Bad_Name_.svg");
        assert!(!name.contains(|c| "<>:\"/\\|?*".contains(c)));
    }

    #[test]
    fn test_sanitize_trims_and_collapses() {
        assert_eq!(sanitize("  ..Create   Customer Account__ "), "Create_Customer_Account");
        assert_eq!(sanitize("___"), "");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(500);
        assert_eq!(sanitize(&long).chars().count(), MAX_NAME_CHARS);

        let tricky = format!("{}_{}", "b".repeat(MAX_NAME_CHARS - 1), "c".repeat(10));
        let cleaned = sanitize(&tricky);
        assert!(!cleaned.ends_with('_'));
        assert!(cleaned.chars().count() <= MAX_NAME_CHARS);
    }

    #[test]
    fn test_filename_gets_extension_once() {
        assert_eq!(sanitize_filename("Process Map"), "Process_Map.svg");
        assert_eq!(sanitize_filename("diagram.svg"), "diagram.svg");
        assert_eq!(sanitize_filename("???"), "untitled.svg");
    }

    #[tokio::test]
    async fn test_save_creates_folders() {
        let temp = TempDir::new().unwrap();
        let mut store = ArtifactStore::new(temp.path());

        let folder = PathBuf::from("1_Retail_Banking_Processes").join("SubSection");
        let path = store
            .save("<svg/>", &folder, "another process")
            .await
            .unwrap();

        assert_eq!(path, temp.path().join(&folder).join("another_process.svg"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg/>");
        assert_eq!(store.extracted_count(), 1);
        assert_eq!(store.failed_count(), 0);
    }

    #[tokio::test]
    async fn test_save_failure_is_counted() {
        let temp = TempDir::new().unwrap();
        // A regular file where a directory is expected
        std::fs::write(temp.path().join("blocked"), "x").unwrap();

        let mut store = ArtifactStore::new(temp.path());
        let result = store.save("<svg/>", Path::new("blocked"), "diagram").await;

        assert!(matches!(result, Err(CrawlError::Storage { .. })));
        assert_eq!(store.failed_count(), 1);
        assert_eq!(store.extracted_count(), 0);
    }
}
