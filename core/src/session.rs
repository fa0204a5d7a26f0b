//! Analytics session: the request/response loop behind the dashboard.
//!
//! Holds the dataset cache and the current filter selection. Every
//! `report()` call recomputes filter + aggregation from the cached
//! canonical dataset; nothing derived is kept between calls.

use crate::{
    aggregate::{self, AnalyticsReport},
    cache::DatasetCache,
    config::PipelineConfig,
    dataset::{Dataset, DatasetInfo},
    error::PipelineResult,
    filter::{self, FilterSelection, FilteredView},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the presentation layer receives after each interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub dataset:          DatasetInfo,
    /// None only when the dataset has no records.
    pub selection:        Option<FilterSelection>,
    pub filtered_records: usize,
    pub report:           AnalyticsReport,
}

pub struct AnalyticsSession {
    cache:     DatasetCache,
    selection: Option<FilterSelection>,
}

impl AnalyticsSession {
    pub fn new(path: impl Into<PathBuf>, config: PipelineConfig) -> Self {
        Self {
            cache:     DatasetCache::new(path, config),
            selection: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        self.cache.config()
    }

    pub fn selection(&self) -> Option<&FilterSelection> {
        self.selection.as_ref()
    }

    pub fn set_filter(&mut self, selection: FilterSelection) {
        self.selection = Some(selection);
    }

    /// Back to the full dataset period with no categorical restriction.
    pub fn reset_filter(&mut self) {
        self.selection = None;
    }

    /// Drop the cached dataset so the next report reloads the source.
    pub fn refresh(&mut self) {
        self.cache.invalidate();
    }

    pub fn report(&mut self) -> PipelineResult<SessionState> {
        let dataset = self.cache.dataset()?;
        let selection = self
            .selection
            .clone()
            .or_else(|| FilterSelection::all(&dataset));
        Ok(evaluate(&dataset, selection, self.cache.config()))
    }
}

/// Filter + aggregate one selection against a dataset.
/// Without a selection (empty dataset) every record passes, which is none.
pub fn evaluate(
    dataset: &Dataset,
    selection: Option<FilterSelection>,
    config: &PipelineConfig,
) -> SessionState {
    let view = match &selection {
        Some(sel) => filter::apply(dataset, sel, config.product_filter_field),
        None => FilteredView::all(dataset),
    };
    let report = aggregate::summarize(&view, config.histogram_bins);
    SessionState {
        dataset: dataset.info().clone(),
        filtered_records: view.len(),
        selection,
        report,
    }
}
