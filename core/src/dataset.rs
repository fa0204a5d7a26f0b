//! The canonical dataset: cleaned, derived, immutable.
//!
//! Built once per data refresh. Filters and aggregations borrow it;
//! nothing mutates it after construction.

use crate::{
    cleaner::{self, CleanReport},
    config::PipelineConfig,
    features::{self, LeadRecord},
    loader::{self, RawTable},
    error::PipelineResult,
    types::{Channel, Product},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path};

/// Dataset-level facts the presentation layer shows next to the filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub total_records:   usize,
    /// First and last creation date. None for an empty dataset.
    pub period:          Option<(NaiveDate, NaiveDate)>,
    /// Distinct channels, first-seen order.
    pub channel_options: Vec<Channel>,
    /// Distinct present products, first-seen order.
    pub product_options: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<LeadRecord>,
    info:    DatasetInfo,
    report:  CleanReport,
}

impl Dataset {
    /// Run Cleaner + Feature Deriver over a raw table.
    pub fn build(raw: &RawTable, config: &PipelineConfig) -> Self {
        let (cleaned, report) = cleaner::clean(raw, config);
        let records = features::derive(cleaned);
        let info = describe(&records);
        log::info!(
            "Canonical dataset: {} records ({} raw rows excluded)",
            records.len(),
            report.excluded()
        );
        Self { records, info, report }
    }

    /// Load, clean and derive in one step.
    pub fn from_csv(path: impl AsRef<Path>, config: &PipelineConfig) -> PipelineResult<Self> {
        let raw = loader::load_csv(path, config)?;
        Ok(Self::build(&raw, config))
    }

    pub fn records(&self) -> &[LeadRecord] {
        &self.records
    }

    pub fn info(&self) -> &DatasetInfo {
        &self.info
    }

    pub fn clean_report(&self) -> &CleanReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn describe(records: &[LeadRecord]) -> DatasetInfo {
    let period = records
        .iter()
        .map(|r| r.creation_date)
        .fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        });

    let mut seen_channels = HashSet::new();
    let mut seen_products = HashSet::new();
    let mut channel_options = Vec::new();
    let mut product_options = Vec::new();
    for record in records {
        if seen_channels.insert(record.channel.as_str()) {
            channel_options.push(record.channel.clone());
        }
        if let Some(product) = record.product.as_deref() {
            if seen_products.insert(product) {
                product_options.push(product.to_string());
            }
        }
    }

    DatasetInfo {
        total_records: records.len(),
        period,
        channel_options,
        product_options,
    }
}
