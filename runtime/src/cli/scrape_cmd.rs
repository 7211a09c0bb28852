//! `lms-scraper scrape`: run the full scrape, then the formatter.

use crate::config::ScraperConfig;
use crate::formatter::{FormatReport, Formatter};
use crate::pipeline::{self, RunSummary};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Flags that override environment configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct ScrapeArgs {
    /// Portal page holding the login form and module list
    #[arg(long)]
    pub portal_url: Option<String>,

    /// Directory for per-module JSON files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Seconds to wait for page elements before giving up
    #[arg(long)]
    pub wait_timeout_secs: Option<u64>,

    /// Lower bound of the pause between modules, in milliseconds
    #[arg(long)]
    pub min_delay_ms: Option<u64>,

    /// Upper bound of the pause between modules, in milliseconds
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Do not run `yarn install` / `yarn format:check --write` afterwards
    #[arg(long)]
    pub skip_format: bool,
}

impl ScrapeArgs {
    /// Apply the flags on top of an environment-derived config.
    pub fn apply(&self, config: &mut ScraperConfig) {
        if let Some(url) = &self.portal_url {
            config.portal_url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(secs) = self.wait_timeout_secs {
            config.wait_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.min_delay_ms {
            config.min_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.max_delay_ms {
            config.max_delay = Duration::from_millis(ms);
        }
        if self.headed {
            config.browser.headless = false;
        }
        if self.skip_format {
            config.run_formatter = false;
        }
    }
}

/// Run the scrape command.
pub async fn run(args: &ScrapeArgs) -> Result<()> {
    let mut config = ScraperConfig::from_env()?;
    args.apply(&mut config);

    let today = chrono::Local::now().date_naive();
    let summary = pipeline::run(&config, today).await?;
    print_summary(&summary);

    if config.run_formatter {
        match Formatter::default().run().await {
            FormatReport::Skipped { missing } => {
                tracing::debug!("formatting skipped, {missing} missing");
            }
            FormatReport::Ran { failed, .. } if !failed.is_empty() => {
                tracing::warn!("formatting finished with failures: {}", failed.join(", "));
            }
            FormatReport::Ran { steps, .. } => tracing::info!("formatting done ({steps} steps)"),
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Scraped {} module(s): {} saved, {} without materials",
        summary.modules_found,
        summary.written.len(),
        summary.discarded.len()
    );
    for path in &summary.written {
        println!("  {}", path.display());
    }
}
