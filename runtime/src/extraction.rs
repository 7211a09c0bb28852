//! Per-module extraction: year resolution, section expansion, link collection.
//!
//! A module moves through the stages in [`ExtractionStage`]:
//! `NavigatedToModule → YearResolved → SectionsExpanded → Extracted`, and
//! the caller finishes it as `Persisted` or `Discarded`.

use crate::locators::PortalLocators;
use crate::renderer::{require, ClickOutcome, PortalPage, UiError, WaitOutcome};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use lms_materials::{
    collect_materials, module_name_from_heading, preceding_selected, AcademicYear, Materials,
    ModuleRecord, YearMarker,
};
use std::fmt;
use std::time::Duration;

/// Where a module is in its extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStage {
    NavigatedToModule,
    YearResolved,
    SectionsExpanded,
    Extracted,
    Persisted,
    Discarded,
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NavigatedToModule => write!(f, "navigated"),
            Self::YearResolved => write!(f, "year resolved"),
            Self::SectionsExpanded => write!(f, "sections expanded"),
            Self::Extracted => write!(f, "extracted"),
            Self::Persisted => write!(f, "persisted"),
            Self::Discarded => write!(f, "discarded"),
        }
    }
}

/// Inputs that stay fixed across modules.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionSettings {
    pub wait_timeout: Duration,
    /// Date the academic year is computed from.
    pub today: NaiveDate,
}

/// A module's name and its collected record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleExtraction {
    pub name: String,
    pub record: ModuleRecord,
}

/// What became of one section group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    Collected(Materials),
    /// The group refused the click.
    NotInteractable,
}

/// Visit a module page and collect its materials.
pub async fn extract_module<P: PortalPage + ?Sized>(
    page: &mut P,
    locators: &PortalLocators,
    url: &str,
    settings: &ExtractionSettings,
) -> Result<ModuleExtraction> {
    page.goto(url).await?;
    let heading = page
        .text(&locators.module_heading)
        .await
        .context("module page has no heading")?;
    let name = module_name_from_heading(&heading);
    tracing::info!("MODULE: {name}");
    tracing::debug!(module = %name, stage = %ExtractionStage::NavigatedToModule);

    let year = resolve_year(page, locators, settings).await?;
    tracing::debug!(module = %name, stage = %ExtractionStage::YearResolved, %year);

    let mut record = ModuleRecord::new(year);
    let sections = page.count(&locators.section_group).await?;
    let mut expanded = 0;
    for index in 0..sections {
        let title = page.nth_text(&locators.section_group, index).await?;
        tracing::info!("Going through {title}");

        match extract_section(page, locators, index, settings.wait_timeout).await? {
            SectionOutcome::Collected(materials) => {
                expanded += 1;
                if !record.insert_section(title.as_str(), materials) {
                    tracing::warn!("section titled {title:?} clashes with the year marker, skipping");
                }
            }
            SectionOutcome::NotInteractable => {
                tracing::debug!("section {title:?} is not interactable, skipping");
            }
        }
    }
    tracing::debug!(
        module = %name,
        stage = %ExtractionStage::SectionsExpanded,
        expanded,
        total = sections
    );
    tracing::debug!(
        module = %name,
        stage = %ExtractionStage::Extracted,
        sections = record.section_count()
    );

    Ok(ModuleExtraction { name, record })
}

/// Select the current academic year, falling back to the preceding dropdown
/// option when the current year shows no sections.
pub async fn resolve_year<P: PortalPage + ?Sized>(
    page: &mut P,
    locators: &PortalLocators,
    settings: &ExtractionSettings,
) -> Result<YearMarker> {
    let current = AcademicYear::containing(settings.today);

    require(page, &locators.year_select, settings.wait_timeout).await?;
    page.select_option(&locators.year_select, &current.option_text())
        .await
        .with_context(|| format!("failed to select {current}"))?;

    if page.count(&locators.section_group).await? > 0 {
        return Ok(YearMarker::Current);
    }

    require(page, &locators.year_select, settings.wait_timeout).await?;
    let options = page.options(&locators.year_select).await?;
    let fallback = preceding_selected(&options)
        .ok_or_else(|| UiError::NoSelectedOption(locators.year_select.to_string()))?;
    tracing::info!("no materials for {current}, trying {}", fallback.text);
    page.select_option(&locators.year_select, &fallback.text)
        .await
        .with_context(|| format!("failed to select {:?}", fallback.text))?;

    Ok(YearMarker::Previous)
}

/// Expand one section group and read its links.
///
/// A link list that never appears is fatal, like any other exhausted wait.
pub async fn extract_section<P: PortalPage + ?Sized>(
    page: &mut P,
    locators: &PortalLocators,
    index: usize,
    wait_timeout: Duration,
) -> Result<SectionOutcome> {
    if page.expand(&locators.section_group, index).await? == ClickOutcome::NotInteractable {
        return Ok(SectionOutcome::NotInteractable);
    }

    let listed = page
        .wait_within(&locators.section_group, index, &locators.link_list, wait_timeout)
        .await?;
    if listed == WaitOutcome::Timeout {
        return Err(UiError::Timeout {
            locator: format!("{} in {}[{index}]", locators.link_list, locators.section_group),
            timeout: wait_timeout,
        }
        .into());
    }

    let anchors = page
        .anchors_within(&locators.section_group, index, &locators.material_link)
        .await?;
    Ok(SectionOutcome::Collected(collect_materials(anchors)))
}
