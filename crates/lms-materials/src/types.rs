//! Core data types for scraped module records.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reserved record key holding the [`YearMarker`].
pub const YEAR_KEY: &str = "year";

/// Which academic year the record's materials were taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YearMarker {
    /// The academic year containing today's date.
    Current,
    /// The option preceding the current one in the portal's year dropdown.
    Previous,
}

impl fmt::Display for YearMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Previous => write!(f, "previous"),
        }
    }
}

/// Material label → URL pairs of one section, in first-seen order.
///
/// Inserting an existing label replaces its URL but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Materials {
    entries: Vec<(String, String)>,
}

impl Materials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a material, returning the URL it replaced (if any).
    pub fn insert(&mut self, label: impl Into<String>, url: impl Into<String>) -> Option<String> {
        let label = label.into();
        let url = url.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, slot)) => Some(std::mem::replace(slot, url)),
            None => {
                self.entries.push((label, url));
                None
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, url)| url.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, u)| (l.as_str(), u.as_str()))
    }
}

impl<L: Into<String>, U: Into<String>> FromIterator<(L, U)> for Materials {
    fn from_iter<T: IntoIterator<Item = (L, U)>>(iter: T) -> Self {
        let mut materials = Materials::new();
        for (label, url) in iter {
            materials.insert(label, url);
        }
        materials
    }
}

impl Serialize for Materials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, url) in &self.entries {
            map.serialize_entry(label, url)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Materials {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MaterialsVisitor;

        impl<'de> Visitor<'de> for MaterialsVisitor {
            type Value = Materials;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of material labels to URLs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Materials, A::Error> {
                let mut materials = Materials::new();
                while let Some((label, url)) = access.next_entry::<String, String>()? {
                    materials.insert(label, url);
                }
                Ok(materials)
            }
        }

        deserializer.deserialize_map(MaterialsVisitor)
    }
}

/// The persisted artifact for one module: a year marker plus named sections.
///
/// Serializes as a flat JSON object whose first key is `"year"`, followed by
/// one key per section in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    year: YearMarker,
    sections: Vec<(String, Materials)>,
}

impl ModuleRecord {
    pub fn new(year: YearMarker) -> Self {
        Self {
            year,
            sections: Vec::new(),
        }
    }

    pub fn year(&self) -> YearMarker {
        self.year
    }

    pub fn set_year(&mut self, year: YearMarker) {
        self.year = year;
    }

    /// Add a section. A repeated title replaces the earlier section in place.
    ///
    /// Returns `false` (and stores nothing) when the title collides with the
    /// reserved `"year"` key.
    pub fn insert_section(&mut self, title: impl Into<String>, materials: Materials) -> bool {
        let title = title.into();
        if title == YEAR_KEY {
            return false;
        }
        match self.sections.iter_mut().find(|(existing, _)| *existing == title) {
            Some((_, slot)) => *slot = materials,
            None => self.sections.push((title, materials)),
        }
        true
    }

    pub fn section(&self, title: &str) -> Option<&Materials> {
        self.sections
            .iter()
            .find(|(existing, _)| existing == title)
            .map(|(_, materials)| materials)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &Materials)> {
        self.sections.iter().map(|(t, m)| (t.as_str(), m))
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Number of top-level keys in the serialized record (always >= 1).
    pub fn key_count(&self) -> usize {
        1 + self.sections.len()
    }

    /// A record carrying nothing but its year marker is not worth persisting.
    pub fn is_empty(&self) -> bool {
        self.key_count() == 1
    }
}

impl Serialize for ModuleRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.key_count()))?;
        map.serialize_entry(YEAR_KEY, &self.year)?;
        for (title, materials) in &self.sections {
            map.serialize_entry(title, materials)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ModuleRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = ModuleRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a module record object with a \"year\" key")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ModuleRecord, A::Error> {
                let mut year = None;
                let mut sections: Vec<(String, Materials)> = Vec::new();
                while let Some(key) = access.next_key::<String>()? {
                    if key == YEAR_KEY {
                        if year.is_some() {
                            return Err(de::Error::duplicate_field("year"));
                        }
                        year = Some(access.next_value::<YearMarker>()?);
                    } else {
                        let materials = access.next_value::<Materials>()?;
                        match sections.iter_mut().find(|(existing, _)| *existing == key) {
                            Some((_, slot)) => *slot = materials,
                            None => sections.push((key, materials)),
                        }
                    }
                }
                let year = year.ok_or_else(|| de::Error::missing_field("year"))?;
                Ok(ModuleRecord { year, sections })
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Derive the module display name from the page heading.
///
/// The portal renders headings as `"<code> - <title>"`; the last segment
/// is the name. Headings without a separator are used whole.
pub fn module_name_from_heading(heading: &str) -> String {
    heading
        .rsplit(" - ")
        .next()
        .unwrap_or(heading)
        .trim()
        .to_string()
}

/// Errors that can occur in the materials library.
#[derive(thiserror::Error, Debug)]
pub enum MaterialsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type MaterialsResult<T> = Result<T, MaterialsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materials_last_write_wins_keeps_position() {
        let mut materials = Materials::new();
        materials.insert("Slides", "https://x/1");
        materials.insert("Notes", "https://x/2");
        let replaced = materials.insert("Slides", "https://x/3");

        assert_eq!(replaced.as_deref(), Some("https://x/1"));
        assert_eq!(materials.len(), 2);
        let labels: Vec<_> = materials.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Slides", "Notes"]);
        assert_eq!(materials.get("Slides"), Some("https://x/3"));
    }

    #[test]
    fn test_record_serializes_year_first() {
        let mut record = ModuleRecord::new(YearMarker::Current);
        record.insert_section("Week 1", [("Slides", "https://x/1")].into_iter().collect());
        record.insert_section("Week 2", Materials::new());

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"year":"current","Week 1":{"Slides":"https://x/1"},"Week 2":{}}"#
        );
    }

    #[test]
    fn test_record_rejects_reserved_section_title() {
        let mut record = ModuleRecord::new(YearMarker::Previous);
        assert!(!record.insert_section("year", Materials::new()));
        assert!(record.is_empty());
        assert_eq!(record.key_count(), 1);
    }

    #[test]
    fn test_record_duplicate_section_replaces_in_place() {
        let mut record = ModuleRecord::new(YearMarker::Current);
        record.insert_section("Week 1", Materials::new());
        record.insert_section("Week 2", Materials::new());
        record.insert_section("Week 1", [("A", "https://a")].into_iter().collect());

        let titles: Vec<_> = record.sections().map(|(t, _)| t).collect();
        assert_eq!(titles, vec!["Week 1", "Week 2"]);
        assert_eq!(record.section("Week 1").unwrap().get("A"), Some("https://a"));
    }

    #[test]
    fn test_record_requires_year_key() {
        let err = serde_json::from_str::<ModuleRecord>(r#"{"Week 1":{}}"#).unwrap_err();
        assert!(err.to_string().contains("year"));
    }

    #[test]
    fn test_record_rejects_unknown_year_marker() {
        assert!(serde_json::from_str::<ModuleRecord>(r#"{"year":"next"}"#).is_err());
    }

    #[test]
    fn test_module_name_from_heading() {
        assert_eq!(
            module_name_from_heading("4BUIS009C - Business Analytics"),
            "Business Analytics"
        );
        assert_eq!(module_name_from_heading("A - B - Final Part"), "Final Part");
        assert_eq!(module_name_from_heading("Standalone"), "Standalone");
        assert_eq!(module_name_from_heading("  X -  Spaced  "), "Spaced");
    }

    #[test]
    fn test_year_marker_display() {
        assert_eq!(YearMarker::Current.to_string(), "current");
        assert_eq!(YearMarker::Previous.to_string(), "previous");
    }
}
