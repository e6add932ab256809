//! Scripted browsing session for traversal tests.
//!
//! Pages are keyed by normalized URL. Every page the session lands on, by
//! navigation or by click, is recorded so tests can assert visit order and
//! the absence of duplicates.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use svgcrawl::adapters::{BrowsingSession, ElementHandle, Target};
use svgcrawl::core::COLLECT_FRAGMENTS_SCRIPT;

/// A clickable element on a fake page
#[derive(Debug, Clone)]
pub struct FakeClickable {
    pub text: String,
    pub href: Option<String>,

    /// Page the session lands on when clicked
    pub goes_to: String,
}

/// One scripted page
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub title: String,
    pub breadcrumb: Vec<String>,
    pub svgs: Vec<String>,
    pub links: Vec<String>,
    pub clickables: HashMap<Target, Vec<FakeClickable>>,
}

impl FakePage {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn breadcrumb(mut self, trail: &[&str]) -> Self {
        self.breadcrumb = trail.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn svg(mut self, markup: impl Into<String>) -> Self {
        self.svgs.push(markup.into());
        self
    }

    pub fn link(mut self, href: &str) -> Self {
        self.links.push(href.to_string());
        self
    }

    /// Add a clickable that lands on `goes_to` without exposing a URL
    pub fn button(mut self, target: Target, text: &str, goes_to: &str) -> Self {
        self.clickables.entry(target).or_default().push(FakeClickable {
            text: text.to_string(),
            href: None,
            goes_to: goes_to.to_string(),
        });
        self
    }

    /// Add a clickable link to `href`
    pub fn anchor(mut self, target: Target, text: &str, href: &str) -> Self {
        self.clickables.entry(target).or_default().push(FakeClickable {
            text: text.to_string(),
            href: Some(href.to_string()),
            goes_to: href.to_string(),
        });
        self
    }
}

/// Scripted session over a set of fake pages
#[derive(Debug, Default)]
pub struct FakeSession {
    pages: HashMap<String, FakePage>,
    current: String,
    failing: HashSet<String>,
    redirects: HashMap<String, String>,

    /// Replacement served from the second landing on a URL onwards
    revisions: HashMap<String, FakePage>,

    /// Every page landed on, in order
    pub visits: Vec<String>,

    /// URLs passed to `navigate`, in order (failed ones included)
    pub navigations: Vec<String>,
}

impl FakeSession {
    /// Start on `home`, which must be added with [`FakeSession::page`]
    pub fn starting_at(home: &str) -> Self {
        Self {
            current: home.to_string(),
            ..Self::default()
        }
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Make navigation to `url` fail
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Make navigation to `from` land on `to`
    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Serve `page` at `url` once the original has been landed on
    pub fn revised(mut self, url: &str, page: FakePage) -> Self {
        self.revisions.insert(url.to_string(), page);
        self
    }

    fn current_page(&self) -> Result<&FakePage> {
        self.pages
            .get(&self.current)
            .ok_or_else(|| anyhow!("no page at {}", self.current))
    }

    /// How many times a URL was landed on
    pub fn visit_count(&self, url: &str) -> usize {
        self.visits.iter().filter(|v| v.as_str() == url).count()
    }
}

#[async_trait]
impl BrowsingSession for FakeSession {
    fn name(&self) -> &str {
        "fake"
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.navigations.push(url.to_string());
        if self.failing.contains(url) {
            bail!("net::ERR_CONNECTION_RESET");
        }
        let destination = self
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        if !self.pages.contains_key(&destination) {
            bail!("404 for {}", url);
        }
        if self.visit_count(&destination) > 0 {
            if let Some(page) = self.revisions.remove(&destination) {
                self.pages.insert(destination.clone(), page);
            }
        }
        self.current = destination.clone();
        self.visits.push(destination);
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.current.clone())
    }

    async fn current_title(&mut self) -> Result<String> {
        Ok(self.current_page()?.title.clone())
    }

    async fn find_clickable(&mut self, target: Target) -> Result<Vec<ElementHandle>> {
        let page = self.current_page()?;
        let handles = page
            .clickables
            .get(&target)
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .map(|(index, c)| ElementHandle {
                        target,
                        index,
                        text: c.text.clone(),
                        href: c.href.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(handles)
    }

    async fn click(&mut self, handle: &ElementHandle) -> Result<()> {
        let page = self.current_page()?;
        let item = page
            .clickables
            .get(&handle.target)
            .and_then(|items| items.get(handle.index))
            .filter(|c| c.text == handle.text)
            .ok_or_else(|| anyhow!("'{}' not on {}", handle.text, self.current))?;

        let destination = item.goes_to.clone();
        if !self.pages.contains_key(&destination) {
            bail!("click led nowhere: {}", destination);
        }
        self.current = destination.clone();
        self.visits.push(destination);
        Ok(())
    }

    async fn execute_script(&mut self, script: &str) -> Result<serde_json::Value> {
        if script == COLLECT_FRAGMENTS_SCRIPT {
            Ok(serde_json::json!(self.current_page()?.svgs))
        } else {
            Ok(serde_json::Value::Null)
        }
    }

    async fn find_links(&mut self) -> Result<Vec<String>> {
        Ok(self.current_page()?.links.clone())
    }

    async fn find_breadcrumb_elements(&mut self) -> Result<Vec<String>> {
        Ok(self.current_page()?.breadcrumb.clone())
    }
}

/// A fragment the classifier keeps (wide, and longer than 1000 characters)
pub fn diagram_svg() -> String {
    let shapes: String = (0..40)
        .map(|i| format!(r#"<rect x="{}" y="10" width="20" height="20"/>"#, i * 25))
        .collect();
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="800">{}</svg>"#,
        shapes
    )
}

/// A fragment the classifier rejects
pub fn icon_svg() -> String {
    r#"<svg width="16" height="16"><path d="M0 0h16v16H0z"/></svg>"#.to_string()
}
