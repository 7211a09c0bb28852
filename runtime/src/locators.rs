//! Named locators for the portal's markup.
//!
//! Every selector the scraper depends on is declared here. When the portal
//! changes its markup, this is the file to update.

use std::fmt;

/// How to find an element on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Element id, without the `#`.
    Id(&'static str),
    /// A single class name, without the `.`.
    Class(&'static str),
    /// Tag name.
    Tag(&'static str),
    /// Absolute XPath expression.
    XPath(&'static str),
}

impl Locator {
    /// CSS selector equivalent. XPath locators have none.
    pub fn css(&self) -> Option<String> {
        match self {
            Self::Id(id) => Some(format!("#{id}")),
            Self::Class(class) => Some(format!(".{class}")),
            Self::Tag(tag) => Some((*tag).to_string()),
            Self::XPath(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Class(class) => write!(f, "class={class}"),
            Self::Tag(tag) => write!(f, "tag={tag}"),
            Self::XPath(path) => write!(f, "xpath={path}"),
        }
    }
}

pub const USER_ID_INPUT: Locator =
    Locator::XPath("/html/body/div[2]/div[2]/div[2]/section/form/fieldset/div[1]/div/input");
pub const PASSWORD_INPUT: Locator =
    Locator::XPath("/html/body/div[2]/div[2]/div[2]/section/form/fieldset/div[2]/div/input");
pub const MODULE_PANEL: Locator = Locator::Class("panel-text");
pub const MODULE_LINK: Locator = Locator::Tag("a");
pub const MODULE_HEADING: Locator = Locator::Id("spanModuleName");
pub const YEAR_SELECT: Locator = Locator::Id("LMSAcadYear");
pub const SECTION_GROUP: Locator = Locator::Class("group");
pub const LINK_LIST: Locator = Locator::Tag("ul");
pub const MATERIAL_LINK: Locator = Locator::Tag("a");

/// The full set of locators one scrape uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalLocators {
    pub user_id_input: Locator,
    pub password_input: Locator,
    /// Landing-page panels, one per module.
    pub module_panel: Locator,
    /// Link inside a module panel; the first match is the module page.
    pub module_link: Locator,
    pub module_heading: Locator,
    pub year_select: Locator,
    /// Collapsible material groups on a module page.
    pub section_group: Locator,
    /// Appears inside a group once it has been expanded.
    pub link_list: Locator,
    pub material_link: Locator,
}

impl Default for PortalLocators {
    fn default() -> Self {
        Self {
            user_id_input: USER_ID_INPUT,
            password_input: PASSWORD_INPUT,
            module_panel: MODULE_PANEL,
            module_link: MODULE_LINK,
            module_heading: MODULE_HEADING,
            year_select: YEAR_SELECT,
            section_group: SECTION_GROUP,
            link_list: LINK_LIST,
            material_link: MATERIAL_LINK,
        }
    }
}
