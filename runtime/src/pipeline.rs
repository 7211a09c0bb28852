//! The scrape run: login, discover, extract each module, persist, pace.

use crate::auth::login;
use crate::config::{Credentials, ScraperConfig};
use crate::discovery::discover_modules;
use crate::extraction::{extract_module, ExtractionSettings, ExtractionStage};
use crate::locators::PortalLocators;
use crate::pacing::Pacer;
use crate::renderer::chromium::ChromiumBrowser;
use crate::renderer::PortalPage;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use lms_materials::{PersistOutcome, RecordStore};
use std::path::PathBuf;
use std::time::Duration;

/// Everything `scrape` needs besides the page.
#[derive(Debug, Clone)]
pub struct ScrapePlan {
    pub portal_url: String,
    pub credentials: Credentials,
    pub locators: PortalLocators,
    pub store: RecordStore,
    pub pacer: Pacer,
    pub wait_timeout: Duration,
    pub today: NaiveDate,
}

impl ScrapePlan {
    pub fn from_config(config: &ScraperConfig, today: NaiveDate) -> Self {
        Self {
            portal_url: config.portal_url.clone(),
            credentials: config.credentials.clone(),
            locators: PortalLocators::default(),
            store: RecordStore::new(&config.data_dir),
            pacer: Pacer::new(config.min_delay, config.max_delay),
            wait_timeout: config.wait_timeout,
            today,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub modules_found: usize,
    pub written: Vec<PathBuf>,
    /// Modules that yielded no materials.
    pub discarded: Vec<String>,
}

/// Launch Chromium, scrape, and close the browser on every path.
pub async fn run(config: &ScraperConfig, today: NaiveDate) -> Result<RunSummary> {
    let plan = ScrapePlan::from_config(config, today);
    let browser = ChromiumBrowser::launch(&config.browser).await?;

    let outcome = async {
        let mut page = browser.open_page(config.wait_timeout).await?;
        scrape(&mut page, &plan).await
    }
    .await;

    if let Err(e) = browser.close().await {
        tracing::warn!("browser did not close cleanly: {e:#}");
    }
    outcome
}

/// Drive an already-open page through the whole scrape.
pub async fn scrape<P: PortalPage + ?Sized>(page: &mut P, plan: &ScrapePlan) -> Result<RunSummary> {
    login(page, &plan.locators, &plan.portal_url, &plan.credentials).await?;
    let urls = discover_modules(page, &plan.locators).await?;

    let settings = ExtractionSettings {
        wait_timeout: plan.wait_timeout,
        today: plan.today,
    };
    let mut summary = RunSummary {
        modules_found: urls.len(),
        ..RunSummary::default()
    };

    for (index, url) in urls.iter().enumerate() {
        let extraction = extract_module(page, &plan.locators, url, &settings)
            .await
            .with_context(|| format!("failed to extract module at {url}"))?;

        let outcome = plan
            .store
            .persist(&extraction.name, &extraction.record)
            .with_context(|| format!("failed to write record for {}", extraction.name))?;
        match outcome {
            PersistOutcome::Written(path) => {
                tracing::info!("saved {}", path.display());
                tracing::debug!(module = %extraction.name, stage = %ExtractionStage::Persisted);
                summary.written.push(path);
            }
            PersistOutcome::Discarded => {
                tracing::info!("no materials for {}, nothing saved", extraction.name);
                tracing::debug!(module = %extraction.name, stage = %ExtractionStage::Discarded);
                summary.discarded.push(extraction.name);
            }
        }

        if index + 1 < urls.len() {
            let slept = plan.pacer.pause().await;
            tracing::debug!("paused {}ms before next module", slept.as_millis());
        }
    }

    Ok(summary)
}
