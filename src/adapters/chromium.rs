//! Chromium browsing session using chromiumoxide.
//!
//! Every DOM capability is a small in-page script; the browser is only
//! asked to load URLs, evaluate scripts and type into the login form.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowsingSession, ElementHandle, Target};
use crate::core::CrawlError;

/// Numbered section headings on the library page
const SECTION_SELECTOR: &str = "li";

/// Anything that looks clickable
const CLICKABLE_SELECTOR: &str = "a, button, li[role='button']";

/// Links into individual process pages
const PROCESS_LINK_SELECTOR: &str = "a[href*='/Content/Index/']";

/// Breadcrumb labels, root first
const BREADCRUMB_SELECTOR: &str = ".breadcrumb a, .breadcrumb span";

/// Submit controls searched for the submit text
const SUBMIT_SELECTOR: &str = "button, input[type='submit'], a";

/// Interval between checks for the post-login marker
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Where and how to log in to the site being crawled
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Landing page of the site
    pub base_url: String,

    /// Link clicked to reveal the login form, if any
    pub login_link_text: Option<String>,

    pub username_selector: String,
    pub password_selector: String,

    /// Visible text of the submit control
    pub submit_text: String,

    /// Text of the link that proves login succeeded; also the library entry
    pub ready_link_text: String,

    /// Chrome/Chromium binary (auto-detected when unset)
    pub chrome_path: Option<PathBuf>,

    pub navigation_timeout: Duration,

    /// Pause after each navigation or click
    pub settle_delay: Duration,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            login_link_text: Some("Partner Login".to_string()),
            username_selector: "input[placeholder='Enter your Username']".to_string(),
            password_selector: "input[placeholder='Password']".to_string(),
            submit_text: "Sign in".to_string(),
            ready_link_text: "Library".to_string(),
            chrome_path: None,
            navigation_timeout: Duration::from_secs(20),
            settle_delay: Duration::from_millis(2000),
        }
    }
}

/// Login credentials
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Element as reported by the enumeration script
#[derive(Debug, Deserialize)]
struct RawElement {
    index: usize,
    text: String,
    href: Option<String>,
}

/// One Chromium tab, logged in to the site
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    profile: SiteProfile,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch Chromium and open a blank tab
    pub async fn launch(profile: SiteProfile, headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(1920, 1080)
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if !headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = profile.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        info!(headless, "Chromium launched");
        Ok(Self {
            browser,
            page,
            profile,
            handler,
        })
    }

    /// Log in and wait for the post-login marker
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), CrawlError> {
        self.try_login(credentials)
            .await
            .map_err(|e| CrawlError::Session(format!("{:#}", e)))?;
        info!(user = %credentials.username, "Login successful");
        Ok(())
    }

    async fn try_login(&mut self, credentials: &Credentials) -> Result<()> {
        let base_url = self.profile.base_url.clone();
        if base_url.is_empty() {
            bail!("no base URL configured");
        }
        self.navigate(&base_url).await?;

        if let Some(text) = self.profile.login_link_text.clone() {
            debug!(link = %text, "Opening login form");
            if !self.click_text("a", &text).await? {
                bail!("login link '{}' not found", text);
            }
            self.settle().await;
        }

        let username_selector = self.profile.username_selector.clone();
        let password_selector = self.profile.password_selector.clone();
        self.type_into(&username_selector, &credentials.username).await?;
        self.type_into(&password_selector, &credentials.password).await?;

        let submit = self.profile.submit_text.clone();
        if !self.click_text(SUBMIT_SELECTOR, &submit).await? {
            bail!("submit control '{}' not found", submit);
        }

        self.wait_for_ready().await
    }

    async fn type_into(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("input '{}' not found", selector))?;
        element
            .click()
            .await
            .with_context(|| format!("failed to focus '{}'", selector))?
            .type_str(value)
            .await
            .with_context(|| format!("failed to type into '{}'", selector))?;
        Ok(())
    }

    /// Poll until the ready link appears or the navigation timeout passes
    async fn wait_for_ready(&mut self) -> Result<()> {
        let marker = self.profile.ready_link_text.clone();
        let script = format!(
            "() => Array.from(document.querySelectorAll('a')).some(el => {} === {})",
            ELEMENT_TEXT,
            js_string(&marker)
        );

        let deadline = Instant::now() + self.profile.navigation_timeout;
        while Instant::now() < deadline {
            match self.evaluate::<bool>(&script).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => debug!(error = %format!("{:#}", e), "Ready check failed"),
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        bail!(
            "'{}' did not appear within {}s",
            marker,
            self.profile.navigation_timeout.as_secs()
        )
    }

    /// Click the first element under `selector` whose text is exactly `text`
    async fn click_text(&mut self, selector: &str, text: &str) -> Result<bool> {
        let script = format!(
            "() => {{ const el = Array.from(document.querySelectorAll({})).find(el => {} === {} || (el.value || '').trim() === {}); if (!el) return false; el.click(); return true; }}",
            js_string(selector),
            ELEMENT_TEXT,
            js_string(text),
            js_string(text)
        );
        self.evaluate(&script).await
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        result
            .into_value()
            .map_err(|e| anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn settle(&self) {
        tokio::time::sleep(self.profile.settle_delay).await;
    }

    /// Close the browser
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        self.handler.abort();
        closed.context("failed to close Chromium")?;
        Ok(())
    }
}

/// Trimmed visible text of `el` inside an enumeration script
const ELEMENT_TEXT: &str = "(el.innerText || el.textContent || '').trim()";

/// CSS selector for a target
fn selector_for(target: Target) -> &'static str {
    match target {
        Target::SectionHeadings => SECTION_SELECTOR,
        Target::GenericClickables => CLICKABLE_SELECTOR,
        Target::ProcessLinks => PROCESS_LINK_SELECTOR,
        Target::LibraryEntry => "a",
    }
}

/// Whether handles of this kind are followed by URL rather than clicked
fn follows_href(target: Target) -> bool {
    matches!(target, Target::ProcessLinks | Target::GenericClickables)
}

/// Quote a string as a JavaScript literal
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn enumerate_script(selector: &str) -> String {
    format!(
        "() => Array.from(document.querySelectorAll({})).map((el, index) => ({{ index, text: {}, href: (el.href && el.href.startsWith('http')) ? el.href : null }}))",
        js_string(selector),
        ELEMENT_TEXT
    )
}

fn click_script(selector: &str, index: usize, text: &str) -> String {
    format!(
        "() => {{ const el = document.querySelectorAll({})[{}]; if (!el || {} !== {}) return false; el.scrollIntoView({{ block: 'center' }}); el.click(); return true; }}",
        js_string(selector),
        index,
        ELEMENT_TEXT,
        js_string(text)
    )
}

fn links_script() -> String {
    "() => Array.from(document.querySelectorAll('a[href]')).map(a => a.href)".to_string()
}

fn breadcrumb_script() -> String {
    format!(
        "() => Array.from(document.querySelectorAll({})).map(el => {}).filter(t => t.length > 0)",
        js_string(BREADCRUMB_SELECTOR),
        ELEMENT_TEXT
    )
}

#[async_trait]
impl BrowsingSession for ChromiumSession {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        let timeout = self.profile.navigation_timeout;
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {
                match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => debug!(url, error = %e, "Navigation wait failed"),
                    Err(_) => debug!(url, "Navigation wait timed out"),
                }
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {}s", timeout.as_secs()),
        }
        self.settle().await;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn current_title(&mut self) -> Result<String> {
        self.evaluate("() => document.title || ''").await
    }

    async fn find_clickable(&mut self, target: Target) -> Result<Vec<ElementHandle>> {
        let raw: Vec<RawElement> = self
            .evaluate(&enumerate_script(selector_for(target)))
            .await
            .with_context(|| format!("failed to enumerate {:?}", target))?;

        let ready_text = self.profile.ready_link_text.as_str();
        let handles = raw
            .into_iter()
            .filter(|el| !el.text.is_empty())
            .filter(|el| target != Target::LibraryEntry || el.text == ready_text)
            .map(|el| ElementHandle {
                target,
                index: el.index,
                text: el.text,
                href: if follows_href(target) { el.href } else { None },
            })
            .collect();
        Ok(handles)
    }

    async fn click(&mut self, handle: &ElementHandle) -> Result<()> {
        let script = click_script(selector_for(handle.target), handle.index, &handle.text);
        let clicked: bool = self.evaluate(&script).await?;
        if !clicked {
            warn!(text = %handle.text, index = handle.index, "Element moved or vanished");
            bail!("'{}' not found at position {}", handle.text, handle.index);
        }
        self.settle().await;
        Ok(())
    }

    async fn execute_script(&mut self, script: &str) -> Result<serde_json::Value> {
        self.evaluate(script).await
    }

    async fn find_links(&mut self) -> Result<Vec<String>> {
        self.evaluate(&links_script()).await
    }

    async fn find_breadcrumb_elements(&mut self) -> Result<Vec<String>> {
        self.evaluate(&breadcrumb_script()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::COLLECT_FRAGMENTS_SCRIPT;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string("a[href*='x']"), r#""a[href*='x']""#);
        assert_eq!(js_string(r#"say "hi""#), r#""say \"hi\"""#);
    }

    #[test]
    fn test_click_script_checks_text() {
        let script = click_script(SECTION_SELECTOR, 3, "1. Retail Banking Processes");
        assert!(script.starts_with("() =>"));
        assert!(script.contains("[3]"));
        assert!(script.contains("\"1. Retail Banking Processes\""));
    }

    #[test]
    fn test_only_links_follow_href() {
        assert!(follows_href(Target::ProcessLinks));
        assert!(!follows_href(Target::SectionHeadings));
        assert!(!follows_href(Target::LibraryEntry));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("alice", "hunter2");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("alice"));
        assert!(!shown.contains("hunter2"));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_collects_svg_from_data_url() {
        let profile = SiteProfile {
            settle_delay: Duration::from_millis(100),
            ..SiteProfile::default()
        };
        let mut session = ChromiumSession::launch(profile, true)
            .await
            .expect("failed to launch");

        session
            .navigate("data:text/html,<title>T</title><svg width='400' height='10'><rect/></svg>")
            .await
            .expect("navigation failed");

        let value = session
            .execute_script(COLLECT_FRAGMENTS_SCRIPT)
            .await
            .expect("script failed");
        let fragments: Vec<String> = serde_json::from_value(value).unwrap();
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].starts_with("<svg"));
        assert_eq!(session.current_title().await.unwrap(), "T");

        session.close().await.unwrap();
    }
}
