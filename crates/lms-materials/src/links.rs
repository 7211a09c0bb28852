//! Filtering raw anchors into section materials.

use serde::{Deserialize, Serialize};

use crate::types::Materials;

/// An anchor as read from a section: its visible label and resolved target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAnchor {
    pub label: String,
    pub href: Option<String>,
}

impl RawAnchor {
    pub fn new(label: impl Into<String>, href: Option<&str>) -> Self {
        Self {
            label: label.into(),
            href: href.map(String::from),
        }
    }
}

/// Whether an anchor target points at an actual material.
///
/// Missing and empty targets are dropped, as are placeholder targets ending
/// in `#` (section headers link to themselves that way).
pub fn is_material_href(href: Option<&str>) -> bool {
    match href {
        Some(h) => !h.is_empty() && !h.ends_with('#'),
        None => false,
    }
}

/// Keep the anchors that point at materials, keyed by label.
///
/// A repeated label overwrites the earlier URL.
pub fn collect_materials<I>(anchors: I) -> Materials
where
    I: IntoIterator<Item = RawAnchor>,
{
    let mut materials = Materials::new();
    for anchor in anchors {
        let href = match anchor.href {
            Some(href) if is_material_href(Some(&href)) => href,
            _ => continue,
        };
        if let Some(previous) = materials.insert(anchor.label.clone(), href) {
            tracing::debug!(label = %anchor.label, %previous, "duplicate material label overwritten");
        }
    }
    materials
}
