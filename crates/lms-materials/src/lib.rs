//! LMS materials: domain model for course material links scraped from a
//! learning-management portal: module records, academic years, link
//! filtering, and per-module JSON files.

pub mod academic_year;
pub mod dropdown;
pub mod links;
pub mod storage;
pub mod types;

pub use academic_year::AcademicYear;
pub use dropdown::{preceding_selected, DropdownOption};
pub use links::{collect_materials, is_material_href, RawAnchor};
pub use storage::{read_record_from, read_record_from_file, write_record_to, PersistOutcome, RecordStore};
pub use types::*;
