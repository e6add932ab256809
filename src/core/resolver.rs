//! Breadcrumb to output-folder resolution.
//!
//! Maps a page's position in the site hierarchy to the folder its diagrams
//! are filed under. Resolution is a pure function of the breadcrumb, so two
//! pages with the same trail always land in the same folder.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::store::sanitize_segment;

/// Folder used when the breadcrumb carries no usable hierarchy
pub const ROOT_SECTION: &str = "Library";

/// Resolved output-folder identity for a page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionPath {
    pub section: String,
    pub subsection: Option<String>,
}

impl SectionPath {
    /// A top-level section with no subsection
    pub fn section(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            subsection: None,
        }
    }

    /// Relative folder under the output root, one sanitized segment per level
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(sanitize_segment(&self.section));
        if let Some(ref sub) = self.subsection {
            dir.push(sanitize_segment(sub));
        }
        dir
    }
}

/// `"<digits>. <name>"`, a numbered top-level section label
fn numbered_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.\s+(.+)$").expect("valid regex"))
}

fn any_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

/// A digit followed by a period, as in "3.4 Clearing and RTGS Processes"
fn dotted_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d\.").expect("valid regex"))
}

/// Spaces to underscores, periods removed
fn flatten_label(label: &str) -> String {
    label.replace(' ', "_").replace('.', "")
}

/// Resolve a breadcrumb trail to its section folder.
///
/// Never sets `subsection`; see [`resolve_page`] for that.
pub fn resolve(breadcrumb: &[String]) -> SectionPath {
    if breadcrumb.len() < 2 {
        return SectionPath::section(ROOT_SECTION);
    }

    // First numbered label anywhere in the trail wins.
    for item in breadcrumb {
        if let Some(caps) = numbered_label().captures(item.trim()) {
            return SectionPath::section(format!("{}_{}", &caps[1], caps[2].replace(' ', "_")));
        }
    }

    let label = &breadcrumb[1];
    if label.contains("Processes") {
        if let Some(digits) = any_digits().find(label) {
            return SectionPath::section(format!("{}_{}", digits.as_str(), flatten_label(label)));
        }
    }

    SectionPath::section(flatten_label(label))
}

/// Resolve a page's folder, adding a subsection from the third breadcrumb
/// label when it names a process group.
pub fn resolve_page(breadcrumb: &[String]) -> SectionPath {
    let mut path = resolve(breadcrumb);

    if let Some(candidate) = breadcrumb.get(2) {
        if candidate.contains("Processes") || dotted_number().is_match(candidate) {
            path.subsection = Some(sanitize_segment(candidate));
        }
    }

    path
}
