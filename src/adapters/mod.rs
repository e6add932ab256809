//! Browsing session interface.
//!
//! The engine never touches a browser directly. Everything it needs from a
//! rendered, logged-in page goes through [`BrowsingSession`], so traversal
//! can be driven by Chromium in production and by a scripted fake in tests.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// Re-export the Chromium session
pub use chromium::{ChromiumSession, Credentials, SiteProfile};

/// Kinds of clickable element the engine asks for.
///
/// Sessions map each to site-specific selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Numbered top-level section headings on the library page
    SectionHeadings,

    /// Any link, button or button-like list item
    GenericClickables,

    /// Links to individual process pages on a section page
    ProcessLinks,

    /// The entry point into the library content tree
    LibraryEntry,
}

/// A clickable element captured at enumeration time.
///
/// `index` is the element's position among the matches for `target` on the
/// page it was found on; sessions use it together with `text` to find the
/// same element again after the DOM has been rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    pub target: Target,
    pub index: usize,

    /// Visible text, trimmed
    pub text: String,

    /// Absolute link target, when the element is a link
    pub href: Option<String>,
}

/// Capabilities of one logged-in browser tab
#[async_trait]
pub trait BrowsingSession: Send {
    /// Human-readable session name
    fn name(&self) -> &str;

    /// Load a URL and wait for it to settle
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// URL of the page currently shown
    async fn current_url(&mut self) -> Result<String>;

    /// Title of the page currently shown
    async fn current_title(&mut self) -> Result<String>;

    /// Clickable elements of the given kind, in document order
    async fn find_clickable(&mut self, target: Target) -> Result<Vec<ElementHandle>>;

    /// Activate a previously found element and wait for the page to settle
    async fn click(&mut self, handle: &ElementHandle) -> Result<()>;

    /// Run a script in the page and return its JSON-converted result
    async fn execute_script(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Every hyperlink target on the page, as written by the browser
    async fn find_links(&mut self) -> Result<Vec<String>>;

    /// Breadcrumb labels, root first, empty labels dropped
    async fn find_breadcrumb_elements(&mut self) -> Result<Vec<String>>;
}
