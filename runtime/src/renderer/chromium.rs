//! Chromium-backed portal page using chromiumoxide.

use super::{ClickOutcome, PortalPage, UiError, WaitOutcome};
use crate::locators::Locator;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use lms_materials::{DropdownOption, RawAnchor};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// How often bounded waits re-check the page.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Error fragments CDP reports when an element exists but cannot be clicked.
const NOT_INTERACTABLE_MARKERS: &[&str] = &[
    "content quads",
    "box model",
    "layout object",
    "not visible",
    "not interactable",
];

/// Find the Chromium binary path.
///
/// Checks the explicit path, then `LMS_CHROMIUM_PATH`, then the system PATH,
/// then the usual macOS install location.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    if let Ok(p) = std::env::var("LMS_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Browser launch settings.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
        }
    }
}

/// A running Chromium instance plus its CDP event handler task.
pub struct ChromiumBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumBrowser {
    /// Launch Chromium. There is no retry; a failed launch is fatal.
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let chrome_path = find_chromium(options.chrome_path.as_deref())
            .context("Chromium not found. Install Chrome or set LMS_CHROMIUM_PATH.")?;

        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);
        builder = if options.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };
        let config = builder
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error: {e}");
                }
            }
        });

        tracing::debug!("Chromium launched (headless={})", options.headless);
        Ok(Self { browser, handler })
    }

    /// Open a blank tab. `settle` bounds waits for navigation after
    /// form submissions and dropdown changes.
    pub async fn open_page(&self, settle: Duration) -> Result<ChromiumPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;
        Ok(ChromiumPage { page, settle })
    }

    /// Close the browser and reap the process.
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Chromium process wait error: {e}");
        }
        self.handler.abort();
        closed.context("failed to close Chromium")?;
        tracing::debug!("Chromium closed");
        Ok(())
    }
}

/// A single Chromium tab implementing [`PortalPage`].
pub struct ChromiumPage {
    page: Page,
    settle: Duration,
}

impl ChromiumPage {
    pub async fn close(self) -> Result<()> {
        self.page.close().await.context("failed to close page")
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>> {
        let found = match locator {
            Locator::XPath(path) => self.page.find_xpaths(*path).await,
            other => self.page.find_elements(css_of(other)?).await,
        };
        found.with_context(|| format!("failed to query {locator}"))
    }

    async fn find_first(&self, locator: &Locator) -> Result<Element> {
        self.find_all(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| UiError::ElementNotFound(locator.to_string()).into())
    }

    async fn find_nth(&self, locator: &Locator, index: usize) -> Result<Element> {
        self.find_all(locator)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| {
                UiError::IndexOutOfRange {
                    locator: locator.to_string(),
                    index,
                }
                .into()
            })
    }

    /// Wait for a navigation triggered by the last action, bounded by `settle`.
    async fn settle(&self) {
        if tokio::time::timeout(self.settle, self.page.wait_for_navigation())
            .await
            .is_err()
        {
            tracing::debug!("no navigation settled within {}s", self.settle.as_secs());
        }
    }

    async fn child_present(&self, items: &Locator, index: usize, child_css: &str) -> bool {
        match self.find_nth(items, index).await {
            Ok(element) => element
                .find_elements(child_css)
                .await
                .map(|found| !found.is_empty())
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl PortalPage for ChromiumPage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        self.settle().await;
        Ok(())
    }

    async fn fill(&mut self, field: &Locator, value: &str) -> Result<()> {
        let element = self.find_first(field).await?;
        element
            .click()
            .await
            .with_context(|| format!("failed to focus {field}"))?;
        element
            .type_str(value)
            .await
            .with_context(|| format!("failed to type into {field}"))?;
        Ok(())
    }

    async fn submit(&mut self, field: &Locator) -> Result<()> {
        let element = self.find_first(field).await?;
        element
            .press_key("Enter")
            .await
            .with_context(|| format!("failed to submit from {field}"))?;
        self.settle().await;
        Ok(())
    }

    async fn text(&mut self, target: &Locator) -> Result<String> {
        let element = self.find_first(target).await?;
        visible_text(&element).await
    }

    async fn count(&mut self, target: &Locator) -> Result<usize> {
        Ok(self.find_all(target).await?.len())
    }

    async fn wait_for(&mut self, target: &Locator, timeout: Duration) -> Result<WaitOutcome> {
        let deadline = Instant::now() + timeout;
        loop {
            // Lookups racing a page reload fail transiently; keep polling.
            if self.find_all(target).await.map(|f| !f.is_empty()).unwrap_or(false) {
                return Ok(WaitOutcome::Found);
            }
            if Instant::now() >= deadline {
                return Ok(WaitOutcome::Timeout);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn first_link_targets(
        &mut self,
        containers: &Locator,
        link: &Locator,
    ) -> Result<Vec<Option<String>>> {
        let link_css = css_of(link)?;
        let mut targets = Vec::new();
        for container in self.find_all(containers).await? {
            let anchors = container
                .find_elements(link_css.as_str())
                .await
                .with_context(|| format!("failed to query {link} in {containers}"))?;
            let target = match anchors.first() {
                Some(anchor) => href_of(anchor).await?,
                None => None,
            };
            targets.push(target);
        }
        Ok(targets)
    }

    async fn options(&mut self, select: &Locator) -> Result<Vec<DropdownOption>> {
        let script = format!(
            r#"(() => {{
                const select = document.querySelector({selector});
                if (!select) return null;
                return Array.from(select.options).map(o => ({{ text: o.text.trim(), selected: o.selected }}));
            }})()"#,
            selector = js_string(&css_of(select)?)?,
        );
        let options: Option<Vec<DropdownOption>> = self
            .page
            .evaluate(script)
            .await
            .with_context(|| format!("failed to read options of {select}"))?
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to decode options of {select}: {e}"))?;
        options.ok_or_else(|| UiError::ElementNotFound(select.to_string()).into())
    }

    async fn select_option(&mut self, select: &Locator, text: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const select = document.querySelector({selector});
                if (!select) return false;
                const wanted = {text};
                const option = Array.from(select.options).find(o => o.text.trim() === wanted);
                if (!option) return false;
                select.value = option.value;
                select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            selector = js_string(&css_of(select)?)?,
            text = js_string(text.trim())?,
        );
        let selected: bool = self
            .page
            .evaluate(script)
            .await
            .with_context(|| format!("failed to select {text:?} in {select}"))?
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to decode selection result: {e}"))?;
        if !selected {
            return Err(UiError::OptionNotFound {
                locator: select.to_string(),
                text: text.to_string(),
            }
            .into());
        }
        self.settle().await;
        Ok(())
    }

    async fn nth_text(&mut self, items: &Locator, index: usize) -> Result<String> {
        let element = self.find_nth(items, index).await?;
        visible_text(&element).await
    }

    async fn expand(&mut self, items: &Locator, index: usize) -> Result<ClickOutcome> {
        let element = self.find_nth(items, index).await?;
        if let Err(e) = element.scroll_into_view().await {
            return Err(expand_failure(ExpandStep::Scroll, e)
                .context(format!("failed to scroll {items}[{index}] into view")));
        }
        match element.click().await {
            Ok(_) => Ok(ClickOutcome::Clicked),
            Err(e) if is_skippable(ExpandStep::Click, &e.to_string()) => {
                Ok(ClickOutcome::NotInteractable)
            }
            Err(e) => Err(expand_failure(ExpandStep::Click, e)
                .context(format!("failed to click {items}[{index}]"))),
        }
    }

    async fn wait_within(
        &mut self,
        items: &Locator,
        index: usize,
        child: &Locator,
        timeout: Duration,
    ) -> Result<WaitOutcome> {
        let child_css = css_of(child)?;
        let deadline = Instant::now() + timeout;
        loop {
            if self.child_present(items, index, &child_css).await {
                return Ok(WaitOutcome::Found);
            }
            if Instant::now() >= deadline {
                return Ok(WaitOutcome::Timeout);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn anchors_within(
        &mut self,
        items: &Locator,
        index: usize,
        anchor: &Locator,
    ) -> Result<Vec<RawAnchor>> {
        let anchor_css = css_of(anchor)?;
        let container = self.find_nth(items, index).await?;
        let elements = container
            .find_elements(anchor_css.as_str())
            .await
            .with_context(|| format!("failed to query {anchor} in {items}[{index}]"))?;

        let mut anchors = Vec::with_capacity(elements.len());
        for element in &elements {
            anchors.push(RawAnchor {
                label: visible_text(element).await?,
                href: href_of(element).await?,
            });
        }
        Ok(anchors)
    }
}

fn css_of(locator: &Locator) -> Result<String> {
    locator
        .css()
        .ok_or_else(|| UiError::UnsupportedLocator(locator.to_string()).into())
}

/// Encode a Rust string as a JavaScript string literal.
fn js_string(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

async fn visible_text(element: &Element) -> Result<String> {
    let text = element
        .inner_text()
        .await
        .context("failed to read element text")?;
    Ok(text.unwrap_or_default().trim().to_string())
}

/// The resolved `href` property (absolute URL), as the browser sees it.
async fn href_of(element: &Element) -> Result<Option<String>> {
    let value = element
        .property("href")
        .await
        .context("failed to read href")?;
    Ok(value.and_then(|v| v.as_str().map(String::from)))
}

/// The two browser actions behind expanding a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpandStep {
    Scroll,
    Click,
}

/// Only a refused click skips the section; a failed scroll is fatal.
fn is_skippable(step: ExpandStep, message: &str) -> bool {
    step == ExpandStep::Click && is_not_interactable_message(message)
}

fn expand_failure(step: ExpandStep, err: CdpError) -> anyhow::Error {
    tracing::debug!("{step:?} failed: {err}");
    anyhow::Error::new(err)
}

fn is_not_interactable_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    NOT_INTERACTABLE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
