//! Pages as the engine sees them once it has landed on them.
//!
//! A page's identity is its normalized URL: scheme, host, path and query,
//! with the fragment stripped.

use serde::{Deserialize, Serialize};
use url::Url;

/// Separator used when a breadcrumb trail is flattened into one string
pub const BREADCRUMB_SEPARATOR: &str = " > ";

/// A page the engine has landed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVisit {
    /// Normalized URL (fragment stripped)
    pub url: String,

    /// Document title at the time of the visit
    pub title: String,

    /// Hierarchy labels from the root entry point down to this page
    pub breadcrumb: Vec<String>,
}

impl PageVisit {
    /// Create a page visit, normalizing the URL when it parses
    pub fn new(url: &str, title: impl Into<String>, breadcrumb: Vec<String>) -> Self {
        let url = normalize_url(url, None)
            .map(String::from)
            .unwrap_or_else(|| url.to_string());

        Self {
            url,
            title: title.into(),
            breadcrumb,
        }
    }

    /// Breadcrumb joined with ` > `, falling back to the title for an empty trail
    pub fn breadcrumb_joined(&self) -> String {
        if self.breadcrumb.is_empty() {
            self.title.clone()
        } else {
            self.breadcrumb.join(BREADCRUMB_SEPARATOR)
        }
    }
}

/// Normalize a (possibly relative) link into a page identity.
///
/// Returns `None` for anything that is not an http(s) URL, such as
/// `javascript:` or `mailto:` links.
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut url = match base {
        Some(base) => base.join(raw).ok()?,
        None => Url::parse(raw).ok()?,
    };

    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    url.set_fragment(None);
    Some(url)
}

/// Whether two URLs point at the same site (host and effective port)
pub fn same_site(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}
