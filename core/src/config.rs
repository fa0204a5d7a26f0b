//! Pipeline configuration: column names, date formats, year bounds.
//!
//! Every field has a default, so a config file only needs to name
//! the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound for `histogram_bins`.
pub const MAX_HISTOGRAM_BINS: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnConfig {
    pub channel:      String,
    pub created_at:   String,
    pub converted_at: String,
    pub product:      String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            channel:      "Toma de contacto".into(),
            created_at:   "Fecha de Creación".into(),
            converted_at: "Fecha de Conversión".into(),
            product:      "Producto".into(),
        }
    }
}

impl ColumnConfig {
    pub fn required(&self) -> [&str; 4] {
        [
            self.channel.as_str(),
            self.created_at.as_str(),
            self.converted_at.as_str(),
            self.product.as_str(),
        ]
    }
}

/// Which record field the product multi-select is matched against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductFilterField {
    /// Match selected products against the contact channel.
    /// This reproduces the behaviour of the dashboard this pipeline feeds.
    #[default]
    Channel,
    /// Match selected products against the product label.
    Product,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns:              ColumnConfig,
    pub created_format:       String,
    pub converted_format:     String,
    pub min_year:             i32,
    pub max_year:             i32,
    /// Cell values read as "no value". The empty cell is always absent.
    pub missing_markers:      Vec<String>,
    pub product_filter_field: ProductFilterField,
    pub histogram_bins:       usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns:              ColumnConfig::default(),
            created_format:       "%d/%m/%Y %H:%M".into(),
            converted_format:     "%d/%m/%Y".into(),
            min_year:             2018,
            max_year:             2021,
            missing_markers:      default_missing_markers(),
            product_filter_field: ProductFilterField::Channel,
            histogram_bins:       20,
        }
    }
}

fn default_missing_markers() -> Vec<String> {
    [
        "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan",
        "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
        "n/a", "nan", "null",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl PipelineConfig {
    /// Load a JSON config file. Absent fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
        log::debug!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    /// Reject values no pipeline run can honour.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_year > self.max_year {
            anyhow::bail!("min_year {} is after max_year {}", self.min_year, self.max_year);
        }
        if self.histogram_bins == 0 || self.histogram_bins > MAX_HISTOGRAM_BINS {
            anyhow::bail!(
                "histogram_bins {} is outside 1..={MAX_HISTOGRAM_BINS}",
                self.histogram_bins
            );
        }
        Ok(())
    }

    pub fn is_missing(&self, cell: &str) -> bool {
        cell.is_empty() || self.missing_markers.iter().any(|m| m == cell)
    }
}
