//! Academic-year labels as shown in the portal's year dropdown.
//!
//! An academic year starts in September: from September onwards the current
//! year is `<year>/<year+1>`, before that it is `<year-1>/<year>`.

use std::fmt;

use chrono::{Datelike, NaiveDate};

/// Prefix the portal puts in front of every year option.
pub const OPTION_PREFIX: &str = "Academic Year ";

/// Last month (1-based) that still belongs to the previous academic year.
const LAST_MONTH_OF_YEAR: u32 = 8;

/// An academic year, identified by the calendar year it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AcademicYear {
    start: i32,
}

impl AcademicYear {
    pub fn starting_in(start: i32) -> Self {
        Self { start }
    }

    /// The academic year that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        if date.month() > LAST_MONTH_OF_YEAR {
            Self::starting_in(date.year())
        } else {
            Self::starting_in(date.year() - 1)
        }
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.start + 1
    }

    /// `"2024/2025"`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.start, self.end())
    }

    /// Visible dropdown text, e.g. `"Academic Year 2024/2025"`.
    pub fn option_text(&self) -> String {
        format!("{OPTION_PREFIX}{}", self.label())
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.end())
    }
}
