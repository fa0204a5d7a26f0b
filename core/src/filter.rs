//! Filter engine: date range plus optional categorical selections.
//!
//! Predicates AND across families, OR within a family. An empty
//! selection set means "no restriction". The view borrows canonical
//! rows; the dataset itself is never touched.

use crate::{
    config::ProductFilterField,
    dataset::Dataset,
    features::LeadRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    /// Inclusive, compared against the creation date (time of day ignored).
    pub start:    NaiveDate,
    pub end:      NaiveDate,
    #[serde(default)]
    pub channels: BTreeSet<String>,
    #[serde(default)]
    pub products: BTreeSet<String>,
}

impl FilterSelection {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            channels: BTreeSet::new(),
            products: BTreeSet::new(),
        }
    }

    /// The whole dataset period, no categorical restriction.
    /// None when the dataset is empty (there is no period to span).
    pub fn all(dataset: &Dataset) -> Option<Self> {
        dataset
            .info()
            .period
            .map(|(start, end)| Self::new(start, end))
    }

    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = channels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_products<I, S>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.products = products.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, record: &LeadRecord, product_field: ProductFilterField) -> bool {
        if record.creation_date < self.start || record.creation_date > self.end {
            return false;
        }
        if !self.channels.is_empty() && !self.channels.contains(&record.channel) {
            return false;
        }
        if !self.products.is_empty() {
            let target = match product_field {
                ProductFilterField::Channel => Some(record.channel.as_str()),
                ProductFilterField::Product => record.product.as_deref(),
            };
            match target {
                Some(value) if self.products.contains(value) => {}
                _ => return false,
            }
        }
        true
    }
}

/// A read-only subset of the canonical dataset, in canonical order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView<'a> {
    records: Vec<&'a LeadRecord>,
}

impl<'a> FilteredView<'a> {
    /// Every record of the dataset, unfiltered.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self { records: dataset.records().iter().collect() }
    }

    pub fn from_records(records: &'a [LeadRecord]) -> Self {
        Self { records: records.iter().collect() }
    }

    pub fn records(&self) -> &[&'a LeadRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a LeadRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn apply<'a>(
    dataset: &'a Dataset,
    selection: &FilterSelection,
    product_field: ProductFilterField,
) -> FilteredView<'a> {
    let records: Vec<&LeadRecord> = dataset
        .records()
        .iter()
        .filter(|r| selection.matches(r, product_field))
        .collect();
    log::debug!(
        "Filter {}..={} channels={:?} products={:?}: {} of {} records",
        selection.start,
        selection.end,
        selection.channels,
        selection.products,
        records.len(),
        dataset.len()
    );
    FilteredView { records }
}
