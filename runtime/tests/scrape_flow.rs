//! Scrape flow integration tests
//!
//! Drives `pipeline::scrape` against an in-memory portal so the login,
//! discovery, year fallback, section handling and file output can be
//! checked without a browser.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use lms_materials::{DropdownOption, RawAnchor, RecordStore};
use lms_scraper::config::Credentials;
use lms_scraper::locators::{Locator, PortalLocators};
use lms_scraper::pacing::Pacer;
use lms_scraper::pipeline::{scrape, ScrapePlan};
use lms_scraper::renderer::{ClickOutcome, PortalPage, UiError, WaitOutcome};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const PORTAL: &str = "https://lms.test/UserModuleMaterials";
const CURRENT: &str = "Academic Year 2024/2025";

// ── Fake portal ──

#[derive(Clone)]
struct FakeSection {
    title: String,
    interactable: bool,
    list_appears: bool,
    anchors: Vec<RawAnchor>,
}

impl FakeSection {
    fn new(title: &str, anchors: &[(&str, &str)]) -> Self {
        Self {
            title: title.to_string(),
            interactable: true,
            list_appears: true,
            anchors: anchors
                .iter()
                .map(|(label, href)| RawAnchor::new(*label, Some(*href)))
                .collect(),
        }
    }

    fn not_interactable(mut self) -> Self {
        self.interactable = false;
        self
    }

    fn without_list(mut self) -> Self {
        self.list_appears = false;
        self
    }
}

#[derive(Clone)]
struct FakeModule {
    heading: String,
    has_year_select: bool,
    /// Dropdown options as (text, selected).
    options: Vec<(String, bool)>,
    /// Sections shown for each selected option text.
    sections: HashMap<String, Vec<FakeSection>>,
}

impl FakeModule {
    fn new(heading: &str, years: &[&str], selected: usize) -> Self {
        Self {
            heading: heading.to_string(),
            has_year_select: true,
            options: years
                .iter()
                .enumerate()
                .map(|(i, y)| (y.to_string(), i == selected))
                .collect(),
            sections: HashMap::new(),
        }
    }

    fn with_sections(mut self, year: &str, sections: Vec<FakeSection>) -> Self {
        self.sections.insert(year.to_string(), sections);
        self
    }

    fn selected(&self) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(_, selected)| *selected)
            .map(|(text, _)| text.as_str())
    }

    fn visible_sections(&self) -> &[FakeSection] {
        self.selected()
            .and_then(|year| self.sections.get(year))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Default)]
struct FakePortal {
    panels: Vec<Option<String>>,
    modules: HashMap<String, FakeModule>,
    current: Option<String>,
    visited: Vec<String>,
    filled: Vec<(String, String)>,
    submitted: Vec<String>,
    selections: Vec<String>,
}

impl FakePortal {
    fn with_module(mut self, url: &str, module: FakeModule) -> Self {
        self.panels.push(Some(url.to_string()));
        self.modules.insert(url.to_string(), module);
        self
    }

    fn module(&self) -> Result<&FakeModule> {
        self.current
            .as_ref()
            .and_then(|url| self.modules.get(url))
            .ok_or_else(|| UiError::ElementNotFound("module page".into()).into())
    }

    fn module_mut(&mut self) -> Result<&mut FakeModule> {
        let url = self.current.clone().unwrap_or_default();
        self.modules
            .get_mut(&url)
            .ok_or_else(|| UiError::ElementNotFound("module page".into()).into())
    }

    fn section(&self, index: usize) -> Result<&FakeSection> {
        self.module()?.visible_sections().get(index).ok_or_else(|| {
            UiError::IndexOutOfRange {
                locator: "section".into(),
                index,
            }
            .into()
        })
    }
}

#[async_trait]
impl PortalPage for FakePortal {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.visited.push(url.to_string());
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn fill(&mut self, field: &Locator, value: &str) -> Result<()> {
        self.filled.push((field.to_string(), value.to_string()));
        Ok(())
    }

    async fn submit(&mut self, field: &Locator) -> Result<()> {
        self.submitted.push(field.to_string());
        Ok(())
    }

    async fn text(&mut self, target: &Locator) -> Result<String> {
        if *target == PortalLocators::default().module_heading {
            return Ok(self.module()?.heading.clone());
        }
        Err(UiError::ElementNotFound(target.to_string()).into())
    }

    async fn count(&mut self, target: &Locator) -> Result<usize> {
        let locators = PortalLocators::default();
        if *target == locators.section_group {
            return Ok(self.module().map(|m| m.visible_sections().len()).unwrap_or(0));
        }
        Ok(0)
    }

    async fn wait_for(&mut self, target: &Locator, _timeout: Duration) -> Result<WaitOutcome> {
        if *target == PortalLocators::default().year_select {
            let present = self.module().map(|m| m.has_year_select).unwrap_or(false);
            return Ok(if present {
                WaitOutcome::Found
            } else {
                WaitOutcome::Timeout
            });
        }
        Ok(WaitOutcome::Timeout)
    }

    async fn first_link_targets(
        &mut self,
        _containers: &Locator,
        _link: &Locator,
    ) -> Result<Vec<Option<String>>> {
        Ok(self.panels.clone())
    }

    async fn options(&mut self, _select: &Locator) -> Result<Vec<DropdownOption>> {
        Ok(self
            .module()?
            .options
            .iter()
            .map(|(text, selected)| DropdownOption::new(text.clone(), *selected))
            .collect())
    }

    async fn select_option(&mut self, select: &Locator, text: &str) -> Result<()> {
        let module = self.module_mut()?;
        if !module.options.iter().any(|(t, _)| t == text) {
            return Err(UiError::OptionNotFound {
                locator: select.to_string(),
                text: text.to_string(),
            }
            .into());
        }
        for (t, selected) in module.options.iter_mut() {
            *selected = t == text;
        }
        self.selections.push(text.to_string());
        Ok(())
    }

    async fn nth_text(&mut self, _items: &Locator, index: usize) -> Result<String> {
        Ok(self.section(index)?.title.clone())
    }

    async fn expand(&mut self, _items: &Locator, index: usize) -> Result<ClickOutcome> {
        Ok(if self.section(index)?.interactable {
            ClickOutcome::Clicked
        } else {
            ClickOutcome::NotInteractable
        })
    }

    async fn wait_within(
        &mut self,
        _items: &Locator,
        index: usize,
        _child: &Locator,
        _timeout: Duration,
    ) -> Result<WaitOutcome> {
        Ok(if self.section(index)?.list_appears {
            WaitOutcome::Found
        } else {
            WaitOutcome::Timeout
        })
    }

    async fn anchors_within(
        &mut self,
        _items: &Locator,
        index: usize,
        _anchor: &Locator,
    ) -> Result<Vec<RawAnchor>> {
        Ok(self.section(index)?.anchors.clone())
    }
}

// ── Helpers ──

fn plan(dir: &Path) -> ScrapePlan {
    ScrapePlan {
        portal_url: PORTAL.to_string(),
        credentials: Credentials {
            user_id: "00012345".to_string(),
            password: "hunter2".to_string(),
        },
        locators: PortalLocators::default(),
        store: RecordStore::new(dir),
        pacer: Pacer::disabled(),
        wait_timeout: Duration::from_millis(10),
        today: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
    }
}

fn read_json(dir: &TempDir, name: &str) -> Value {
    let text = std::fs::read_to_string(dir.path().join(format!("{name}.json"))).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ── Tests ──

#[tokio::test]
async fn writes_module_file_with_filtered_links() {
    let dir = TempDir::new().unwrap();
    let module = FakeModule::new("CS - Intro", &[CURRENT, "Academic Year 2023/2024"], 1)
        .with_sections(
            CURRENT,
            vec![
                FakeSection::new(
                    "Week 1",
                    &[("Week 1", "https://lms.test/m#"), ("Slides", "https://x/1")],
                ),
                FakeSection::new("Week 2", &[("Week 2", "#")]),
            ],
        );
    let mut portal = FakePortal::default().with_module("https://lms.test/m/1", module);

    let summary = scrape(&mut portal, &plan(dir.path())).await.unwrap();

    assert_eq!(summary.modules_found, 1);
    assert_eq!(summary.written, vec![dir.path().join("Intro.json")]);
    assert!(summary.discarded.is_empty());
    assert_eq!(portal.selections, vec![CURRENT.to_string()]);

    let text = std::fs::read_to_string(dir.path().join("Intro.json")).unwrap();
    assert_eq!(
        text,
        "{\n  \"year\": \"current\",\n  \"Week 1\": {\n    \"Slides\": \"https://x/1\"\n  },\n  \"Week 2\": {}\n}"
    );
}

#[tokio::test]
async fn falls_back_to_option_before_selected() {
    let dir = TempDir::new().unwrap();
    // Selecting the current year leaves it as the first option, so the
    // fallback wraps to the last one.
    let module = FakeModule::new(
        "Databases",
        &[CURRENT, "Academic Year 2023/2024", "Academic Year 2022/2023"],
        0,
    )
    .with_sections(
        "Academic Year 2022/2023",
        vec![FakeSection::new("Archive", &[("Old notes", "https://x/old")])],
    );
    let mut portal = FakePortal::default().with_module("https://lms.test/m/db", module);

    scrape(&mut portal, &plan(dir.path())).await.unwrap();

    assert_eq!(
        portal.selections,
        vec![CURRENT.to_string(), "Academic Year 2022/2023".to_string()]
    );
    assert_eq!(
        read_json(&dir, "Databases"),
        json!({"year": "previous", "Archive": {"Old notes": "https://x/old"}})
    );
}

#[tokio::test]
async fn module_without_sections_is_discarded() {
    let dir = TempDir::new().unwrap();
    let empty = FakeModule::new("Empty", &[CURRENT, "Academic Year 2023/2024"], 0);
    let full = FakeModule::new("Full", &[CURRENT], 0)
        .with_sections(CURRENT, vec![FakeSection::new("Week 1", &[("A", "https://x/a")])]);
    let mut portal = FakePortal::default()
        .with_module("https://lms.test/m/empty", empty)
        .with_module("https://lms.test/m/full", full);

    let summary = scrape(&mut portal, &plan(dir.path())).await.unwrap();

    assert_eq!(summary.modules_found, 2);
    assert_eq!(summary.discarded, vec!["Empty".to_string()]);
    assert_eq!(summary.written, vec![dir.path().join("Full.json")]);
    assert!(!dir.path().join("Empty.json").exists());
}

#[tokio::test]
async fn skips_section_that_refuses_click() {
    let dir = TempDir::new().unwrap();
    let module = FakeModule::new("Networks", &[CURRENT], 0).with_sections(
        CURRENT,
        vec![
            FakeSection::new("Hidden", &[("H", "https://x/h")]).not_interactable(),
            FakeSection::new("Week 1", &[("Lab", "https://x/lab")]),
        ],
    );
    let mut portal = FakePortal::default().with_module("https://lms.test/m/net", module);

    scrape(&mut portal, &plan(dir.path())).await.unwrap();

    assert_eq!(
        read_json(&dir, "Networks"),
        json!({"year": "current", "Week 1": {"Lab": "https://x/lab"}})
    );
}

#[tokio::test]
async fn link_list_timeout_aborts_run() {
    let dir = TempDir::new().unwrap();
    let module = FakeModule::new("Networks", &[CURRENT], 0).with_sections(
        CURRENT,
        vec![
            FakeSection::new("Slow", &[("S", "https://x/s")]).without_list(),
            FakeSection::new("Week 1", &[("Lab", "https://x/lab")]),
        ],
    );
    let mut portal = FakePortal::default().with_module("https://lms.test/m/net", module);

    let err = scrape(&mut portal, &plan(dir.path())).await.unwrap_err();

    assert!(format!("{err:#}").contains("timed out"));
    assert!(!dir.path().join("Networks.json").exists());
}

#[tokio::test]
async fn missing_year_dropdown_aborts_run() {
    let dir = TempDir::new().unwrap();
    let mut module = FakeModule::new("Broken", &[CURRENT], 0);
    module.has_year_select = false;
    let mut portal = FakePortal::default().with_module("https://lms.test/m/broken", module);

    let err = scrape(&mut portal, &plan(dir.path())).await.unwrap_err();

    assert!(format!("{err:#}").contains("timed out"));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn logs_in_before_visiting_modules() {
    let dir = TempDir::new().unwrap();
    let module = FakeModule::new("Maths", &[CURRENT], 0)
        .with_sections(CURRENT, vec![FakeSection::new("Week 1", &[("A", "https://x/a")])]);
    let mut portal = FakePortal::default().with_module("https://lms.test/m/maths", module);
    portal.panels.insert(0, None);

    let summary = scrape(&mut portal, &plan(dir.path())).await.unwrap();

    let locators = PortalLocators::default();
    assert_eq!(
        portal.filled,
        vec![
            (locators.user_id_input.to_string(), "00012345".to_string()),
            (locators.password_input.to_string(), "hunter2".to_string()),
        ]
    );
    assert_eq!(portal.submitted, vec![locators.password_input.to_string()]);
    assert_eq!(
        portal.visited,
        vec![PORTAL.to_string(), "https://lms.test/m/maths".to_string()]
    );
    // The panel without a link is not counted.
    assert_eq!(summary.modules_found, 1);
}

#[tokio::test]
async fn repeated_module_links_are_all_visited_in_order() {
    let dir = TempDir::new().unwrap();
    let a = FakeModule::new("A", &[CURRENT], 0)
        .with_sections(CURRENT, vec![FakeSection::new("Week 1", &[("A", "https://x/a")])]);
    let b = FakeModule::new("B", &[CURRENT], 0)
        .with_sections(CURRENT, vec![FakeSection::new("Week 1", &[("B", "https://x/b")])]);
    let mut portal = FakePortal::default()
        .with_module("https://lms.test/m/a", a.clone())
        .with_module("https://lms.test/m/b", b)
        .with_module("https://lms.test/m/a", a);

    let summary = scrape(&mut portal, &plan(dir.path())).await.unwrap();

    assert_eq!(summary.modules_found, 3);
    assert_eq!(
        portal.visited[1..],
        [
            "https://lms.test/m/a".to_string(),
            "https://lms.test/m/b".to_string(),
            "https://lms.test/m/a".to_string(),
        ]
    );
    assert_eq!(summary.written.len(), 3);
}
