//! Feature deriver: turns cleaned rows into canonical lead records.
//!
//! Pure: no I/O, no hidden state. Every derived field is a function
//! of the cleaned row alone.

use crate::{
    cleaner::CleanRecord,
    types::{Channel, DayOfWeek, Product, YearMonth},
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// A canonical record: cleaned source fields plus derived columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub channel:             Channel,
    pub created_at:          NaiveDateTime,
    pub converted_at:        Option<NaiveDateTime>,
    pub product:             Option<Product>,
    /// True iff a product is present. The conversion timestamp plays no part.
    pub converted:           bool,
    /// Whole days between creation and conversion, absolute.
    /// None when the conversion timestamp is absent.
    pub days_to_conversion:  Option<i64>,
    pub creation_year:       i32,
    pub creation_month:      u32,
    pub creation_year_month: YearMonth,
    pub creation_weekday:    DayOfWeek,
    pub creation_date:       NaiveDate,
}

pub fn derive(rows: Vec<CleanRecord>) -> Vec<LeadRecord> {
    rows.into_iter().map(derive_one).collect()
}

pub fn derive_one(row: CleanRecord) -> LeadRecord {
    let created = row.created_at;
    let creation_date = created.date();
    let days_to_conversion = row
        .converted_at
        .map(|converted| days_between(created, converted));

    LeadRecord {
        converted: row.product.is_some(),
        days_to_conversion,
        creation_year: created.year(),
        creation_month: created.month(),
        creation_year_month: YearMonth::of(&created),
        creation_weekday: DayOfWeek::of(creation_date),
        creation_date,
        channel: row.channel,
        created_at: created,
        converted_at: row.converted_at,
        product: row.product,
    }
}

/// `|floor((to - from) / 1 day)|`.
///
/// The day count floors before taking the magnitude, so a conversion dated
/// midnight of the creation day (created 10:00) counts as one day.
pub fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    let seconds = (to - from).num_seconds();
    seconds.div_euclid(SECONDS_PER_DAY).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn forward_gap_truncates_partial_day() {
        assert_eq!(days_between(ts("2019-01-01 10:00"), ts("2019-01-05 00:00")), 3);
    }

    #[test]
    fn backward_gap_is_non_negative() {
        assert_eq!(days_between(ts("2019-01-05 10:00"), ts("2019-01-01 00:00")), 5);
        assert_eq!(days_between(ts("2019-01-05 00:00"), ts("2019-01-01 00:00")), 4);
    }

    #[test]
    fn same_instant_is_zero() {
        assert_eq!(days_between(ts("2019-01-05 00:00"), ts("2019-01-05 00:00")), 0);
    }
}
