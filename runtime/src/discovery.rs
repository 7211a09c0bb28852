//! Module discovery on the landing page.

use crate::locators::PortalLocators;
use crate::renderer::PortalPage;
use anyhow::{Context, Result};

/// Collect module page URLs in page order.
///
/// Each module panel contributes the target of its first link. Duplicates
/// are kept. Panels without a usable link are skipped.
pub async fn discover_modules<P: PortalPage + ?Sized>(
    page: &mut P,
    locators: &PortalLocators,
) -> Result<Vec<String>> {
    let targets = page
        .first_link_targets(&locators.module_panel, &locators.module_link)
        .await
        .context("failed to read module panels")?;

    let mut urls = Vec::with_capacity(targets.len());
    for (index, target) in targets.into_iter().enumerate() {
        match target {
            Some(url) if !url.is_empty() => urls.push(url),
            _ => tracing::warn!("module panel {index} has no link, skipping"),
        }
    }

    tracing::info!("found {} module(s)", urls.len());
    Ok(urls)
}
