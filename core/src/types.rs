//! Shared primitive types used across the pipeline.
//!
//! Calendar keys live here so that every stage (deriver, filter,
//! aggregator) agrees on their ordering.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contact-channel label, e.g. "Web" or "Teléfono".
pub type Channel = String;

/// A product label. Present only on converted leads.
pub type Product = String;

/// A year + month period key. Orders chronologically (year, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year:  i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(ts: &NaiveDateTime) -> Self {
        Self { year: ts.year(), month: ts.month() }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Day of the week with an explicit Monday-first ordering.
///
/// No `Ord`: the only ordering is the `ORDER` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ORDER: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
            chrono::Weekday::Sun => DayOfWeek::Sunday,
        }
    }

    /// Position in `ORDER` (Monday = 0).
    pub fn index(self) -> usize {
        match self {
            DayOfWeek::Monday    => 0,
            DayOfWeek::Tuesday   => 1,
            DayOfWeek::Wednesday => 2,
            DayOfWeek::Thursday  => 3,
            DayOfWeek::Friday    => 4,
            DayOfWeek::Saturday  => 5,
            DayOfWeek::Sunday    => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Monday    => "Monday",
            DayOfWeek::Tuesday   => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday  => "Thursday",
            DayOfWeek::Friday    => "Friday",
            DayOfWeek::Saturday  => "Saturday",
            DayOfWeek::Sunday    => "Sunday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
