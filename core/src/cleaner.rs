//! Cleaner: drops structurally invalid rows and parses dates.
//!
//! Exclusion order (fixed):
//!   1. channel absent
//!   2. channel blank / whitespace-only
//!   3. creation timestamp unparseable
//!   4. conversion timestamp unparseable → field becomes None, row kept
//!   5. creation year outside [min_year, max_year]
//!
//! Surviving rows keep the source order.

use crate::{
    config::PipelineConfig,
    loader::{RawRecord, RawTable},
    types::{Channel, Product},
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub channel:      Channel,
    pub created_at:   NaiveDateTime,
    pub converted_at: Option<NaiveDateTime>,
    pub product:      Option<Product>,
}

/// Why a raw row did not make it into the canonical dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    MissingChannel,
    BlankChannel,
    UnparseableCreated,
    YearOutOfRange,
}

/// Per-run counters. Rows excluded here are expected, not errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanReport {
    pub input_rows:            usize,
    pub missing_channel:       usize,
    pub blank_channel:         usize,
    pub unparseable_created:   usize,
    pub out_of_range_year:     usize,
    /// Rows kept with their conversion timestamp dropped.
    pub unparseable_converted: usize,
    pub retained:              usize,
}

impl CleanReport {
    fn record(&mut self, reason: ExclusionReason) {
        match reason {
            ExclusionReason::MissingChannel     => self.missing_channel += 1,
            ExclusionReason::BlankChannel       => self.blank_channel += 1,
            ExclusionReason::UnparseableCreated => self.unparseable_created += 1,
            ExclusionReason::YearOutOfRange     => self.out_of_range_year += 1,
        }
    }

    pub fn excluded(&self) -> usize {
        self.missing_channel
            + self.blank_channel
            + self.unparseable_created
            + self.out_of_range_year
    }
}

pub fn clean(raw: &RawTable, config: &PipelineConfig) -> (Vec<CleanRecord>, CleanReport) {
    let mut report = CleanReport {
        input_rows: raw.len(),
        ..CleanReport::default()
    };
    let mut rows = Vec::with_capacity(raw.len());

    for record in &raw.rows {
        match clean_row(record, config, &mut report) {
            Ok(row) => rows.push(row),
            Err(reason) => report.record(reason),
        }
    }
    report.retained = rows.len();

    if report.unparseable_converted > 0 {
        log::warn!(
            "{} conversion timestamps did not match '{}' and were treated as absent",
            report.unparseable_converted,
            config.converted_format
        );
    }
    log::debug!(
        "Cleaner: {} in, {} kept, {} excluded (missing channel {}, blank channel {}, \
         bad creation date {}, year out of range {})",
        report.input_rows,
        report.retained,
        report.excluded(),
        report.missing_channel,
        report.blank_channel,
        report.unparseable_created,
        report.out_of_range_year,
    );
    (rows, report)
}

fn clean_row(
    record: &RawRecord,
    config: &PipelineConfig,
    report: &mut CleanReport,
) -> Result<CleanRecord, ExclusionReason> {
    let channel = record.channel.as_deref().ok_or(ExclusionReason::MissingChannel)?;
    if channel.trim().is_empty() {
        return Err(ExclusionReason::BlankChannel);
    }

    let created_at = record
        .created_at
        .as_deref()
        .and_then(|s| parse_created(s, &config.created_format))
        .ok_or(ExclusionReason::UnparseableCreated)?;

    let converted_raw = record.converted_at.as_deref();
    let converted_at = converted_raw.and_then(|s| parse_converted(s, &config.converted_format));

    let year = created_at.year();
    if year < config.min_year || year > config.max_year {
        return Err(ExclusionReason::YearOutOfRange);
    }
    if converted_raw.is_some() && converted_at.is_none() {
        report.unparseable_converted += 1;
    }

    Ok(CleanRecord {
        channel: channel.to_string(),
        created_at,
        converted_at,
        product: record.product.clone(),
    })
}

/// Parse a full timestamp such as `15/01/2019 09:00`.
pub fn parse_created(s: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), format).ok()
}

/// Parse a date-only value such as `15/01/2019`, placed at midnight.
pub fn parse_converted(s: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(s.trim(), format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
