//! Page abstraction for driving the portal.
//!
//! Defines the `PortalPage` trait the scrape steps are written against
//! (currently implemented for Chromium via chromiumoxide). Elements inside
//! a repeated group are addressed by locator plus index so no element
//! handle outlives a single call.

pub mod chromium;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use lms_materials::{DropdownOption, RawAnchor};

use crate::locators::Locator;

/// Result of a bounded wait for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Found,
    Timeout,
}

/// Result of clicking an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Clicked,
    /// The element exists but the browser refused to click it.
    NotInteractable,
}

/// UI failures that abort the scrape.
#[derive(thiserror::Error, Debug)]
pub enum UiError {
    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("no element {locator} at index {index}")]
    IndexOutOfRange { locator: String, index: usize },

    #[error("timed out after {}s waiting for {locator}", .timeout.as_secs())]
    Timeout { locator: String, timeout: Duration },

    #[error("no option with text {text:?} in {locator}")]
    OptionNotFound { locator: String, text: String },

    #[error("no option is selected in {0}")]
    NoSelectedOption(String),

    #[error("locator {0} cannot be used here (CSS selector required)")]
    UnsupportedLocator(String),
}

/// A browser page the scraper can drive.
#[async_trait]
pub trait PortalPage: Send {
    /// Navigate to a URL and wait for it to load.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Click into an input and type a value.
    async fn fill(&mut self, field: &Locator, value: &str) -> Result<()>;

    /// Press Enter in a field and let the resulting navigation settle.
    async fn submit(&mut self, field: &Locator) -> Result<()>;

    /// Visible text of the first matching element.
    async fn text(&mut self, target: &Locator) -> Result<String>;

    /// Number of matching elements currently on the page.
    async fn count(&mut self, target: &Locator) -> Result<usize>;

    /// Poll until at least one element matches or the timeout elapses.
    async fn wait_for(&mut self, target: &Locator, timeout: Duration) -> Result<WaitOutcome>;

    /// For each container, the resolved target of its first `link` (if any).
    async fn first_link_targets(
        &mut self,
        containers: &Locator,
        link: &Locator,
    ) -> Result<Vec<Option<String>>>;

    /// Options of a `<select>`, in list order.
    async fn options(&mut self, select: &Locator) -> Result<Vec<DropdownOption>>;

    /// Choose the option whose visible text equals `text`.
    async fn select_option(&mut self, select: &Locator, text: &str) -> Result<()>;

    /// Visible text of the `index`-th matching element.
    async fn nth_text(&mut self, items: &Locator, index: usize) -> Result<String>;

    /// Scroll the `index`-th matching element into view and click it.
    async fn expand(&mut self, items: &Locator, index: usize) -> Result<ClickOutcome>;

    /// Poll until `child` appears inside the `index`-th matching element.
    async fn wait_within(
        &mut self,
        items: &Locator,
        index: usize,
        child: &Locator,
        timeout: Duration,
    ) -> Result<WaitOutcome>;

    /// Label and resolved target of every `anchor` inside the `index`-th element.
    async fn anchors_within(
        &mut self,
        items: &Locator,
        index: usize,
        anchor: &Locator,
    ) -> Result<Vec<RawAnchor>>;
}

/// Wait for an element and turn a timeout into a hard [`UiError::Timeout`].
pub async fn require<P: PortalPage + ?Sized>(
    page: &mut P,
    target: &Locator,
    timeout: Duration,
) -> Result<()> {
    match page.wait_for(target, timeout).await? {
        WaitOutcome::Found => Ok(()),
        WaitOutcome::Timeout => Err(UiError::Timeout {
            locator: target.to_string(),
            timeout,
        }
        .into()),
    }
}
