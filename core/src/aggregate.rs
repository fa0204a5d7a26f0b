//! Aggregator: headline metrics and grouped summaries over a filtered view.
//!
//! Tables and their key order:
//!   monthly   YearMonth   chronological
//!   yearly    i32         chronological
//!   channel   String      converted_count desc, ties by key asc
//!   product   String      converted rows only, converted_count desc, ties by key asc
//!   weekday   DayOfWeek   Monday to Sunday, all seven always present
//!   daily     NaiveDate   chronological
//!
//! Zero rows is a valid input everywhere. Rates are None when the
//! denominator is zero; they are never reported as 0 or NaN.

use crate::{
    config::MAX_HISTOGRAM_BINS,
    features::LeadRecord,
    filter::FilteredView,
    types::{Channel, DayOfWeek, Product, YearMonth},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRow<K> {
    pub key:             K,
    pub count:           u64,
    pub converted_count: u64,
    /// converted / count × 100. None when count == 0.
    pub conversion_rate: Option<f64>,
}

impl<K> AggregationRow<K> {
    pub fn new(key: K, count: u64, converted_count: u64) -> Self {
        Self {
            key,
            count,
            converted_count,
            conversion_rate: conversion_rate(converted_count, count),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadlineMetrics {
    pub total_records:           u64,
    pub total_converted:         u64,
    pub conversion_rate:         Option<f64>,
    /// Mean over converted records with a known conversion date.
    pub mean_days_to_conversion: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub headline:        HeadlineMetrics,
    pub monthly:         Vec<AggregationRow<YearMonth>>,
    pub yearly:          Vec<AggregationRow<i32>>,
    pub by_channel:      Vec<AggregationRow<Channel>>,
    pub by_product:      Vec<AggregationRow<Product>>,
    pub by_weekday:      Vec<AggregationRow<DayOfWeek>>,
    pub daily:           Vec<AggregationRow<NaiveDate>>,
    pub conversion_days: Vec<HistogramBin>,
}

// ── Entry point ──────────────────────────────────────────────────────────────

pub fn summarize(view: &FilteredView<'_>, histogram_bins: usize) -> AnalyticsReport {
    let report = AnalyticsReport {
        headline:        headline(view),
        monthly:         monthly(view),
        yearly:          yearly(view),
        by_channel:      by_channel(view),
        by_product:      by_product(view),
        by_weekday:      by_weekday(view),
        daily:           daily(view),
        conversion_days: conversion_days_histogram(view, histogram_bins),
    };
    log::debug!(
        "Aggregated {} records: {} months, {} channels, {} products, {} days",
        report.headline.total_records,
        report.monthly.len(),
        report.by_channel.len(),
        report.by_product.len(),
        report.daily.len()
    );
    report
}

/// converted / count × 100, or None when count is zero.
pub fn conversion_rate(converted: u64, count: u64) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(converted as f64 / count as f64 * 100.0)
    }
}

// ── Headline ─────────────────────────────────────────────────────────────────

pub fn headline(view: &FilteredView<'_>) -> HeadlineMetrics {
    let total_records = view.len() as u64;
    let total_converted = view.iter().filter(|r| r.converted).count() as u64;

    let (sum, n) = view
        .iter()
        .filter(|r| r.converted)
        .filter_map(|r| r.days_to_conversion)
        .fold((0i64, 0u64), |(sum, n), d| (sum + d, n + 1));
    let mean_days_to_conversion = if n == 0 { None } else { Some(sum as f64 / n as f64) };

    HeadlineMetrics {
        total_records,
        total_converted,
        conversion_rate: conversion_rate(total_converted, total_records),
        mean_days_to_conversion,
    }
}

// ── Grouped tables ───────────────────────────────────────────────────────────

/// (count, converted) per key, keys in ascending order.
fn tally<'a, K, F>(
    records: impl Iterator<Item = &'a LeadRecord>,
    key: F,
) -> BTreeMap<K, (u64, u64)>
where
    K: Ord,
    F: Fn(&'a LeadRecord) -> K,
{
    let mut groups: BTreeMap<K, (u64, u64)> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(key(record)).or_default();
        entry.0 += 1;
        if record.converted {
            entry.1 += 1;
        }
    }
    groups
}

fn into_rows<K>(groups: BTreeMap<K, (u64, u64)>) -> Vec<AggregationRow<K>> {
    groups
        .into_iter()
        .map(|(key, (count, converted))| AggregationRow::new(key, count, converted))
        .collect()
}

/// Stable sort keeps ascending key order among equal converted counts.
fn by_converted_desc<K>(mut rows: Vec<AggregationRow<K>>) -> Vec<AggregationRow<K>> {
    rows.sort_by(|a, b| b.converted_count.cmp(&a.converted_count));
    rows
}

pub fn monthly(view: &FilteredView<'_>) -> Vec<AggregationRow<YearMonth>> {
    into_rows(tally(view.iter(), |r| r.creation_year_month))
}

pub fn yearly(view: &FilteredView<'_>) -> Vec<AggregationRow<i32>> {
    into_rows(tally(view.iter(), |r| r.creation_year))
}

pub fn by_channel(view: &FilteredView<'_>) -> Vec<AggregationRow<Channel>> {
    by_converted_desc(into_rows(tally(view.iter(), |r| r.channel.clone())))
}

/// Converted rows only, grouped by product. Callers truncate for top-N views.
pub fn by_product(view: &FilteredView<'_>) -> Vec<AggregationRow<Product>> {
    let converted = view.iter().filter(|r| r.converted);
    let mut groups: BTreeMap<Product, (u64, u64)> = BTreeMap::new();
    for record in converted {
        if let Some(product) = &record.product {
            let entry = groups.entry(product.clone()).or_default();
            entry.0 += 1;
            entry.1 += 1;
        }
    }
    by_converted_desc(into_rows(groups))
}

pub fn by_weekday(view: &FilteredView<'_>) -> Vec<AggregationRow<DayOfWeek>> {
    let mut slots = [(0u64, 0u64); 7];
    for record in view.iter() {
        let slot = &mut slots[record.creation_weekday.index()];
        slot.0 += 1;
        if record.converted {
            slot.1 += 1;
        }
    }
    DayOfWeek::ORDER
        .iter()
        .map(|day| {
            let (count, converted) = slots[day.index()];
            AggregationRow::new(*day, count, converted)
        })
        .collect()
}

pub fn daily(view: &FilteredView<'_>) -> Vec<AggregationRow<NaiveDate>> {
    into_rows(tally(view.iter(), |r| r.creation_date))
}

// ── Conversion-time distribution ─────────────────────────────────────────────

/// Equal-width bins over the defined `days_to_conversion` values of
/// converted records. The last bin is closed on the right.
/// `bins` is capped at `MAX_HISTOGRAM_BINS`.
pub fn conversion_days_histogram(view: &FilteredView<'_>, bins: usize) -> Vec<HistogramBin> {
    let bins = bins.min(MAX_HISTOGRAM_BINS);
    let values: Vec<i64> = view
        .iter()
        .filter(|r| r.converted)
        .filter_map(|r| r.days_to_conversion)
        .collect();

    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if min == max {
        return vec![HistogramBin {
            lower: min as f64,
            upper: max as f64,
            count: values.len() as u64,
        }];
    }

    let lower = min as f64;
    let width = (max - min) as f64 / bins as f64;
    let mut counts = vec![0u64; bins];
    for v in &values {
        let idx = (((*v - min) as f64) / width).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lower + width * i as f64,
            upper: if i + 1 == bins { max as f64 } else { lower + width * (i + 1) as f64 },
            count,
        })
        .collect()
}
