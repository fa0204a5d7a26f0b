//! Record loader: reads the lead export into untyped rows.
//!
//! RULE: nothing is parsed or validated here beyond the header contract.
//! Dates stay as text; the Cleaner decides what survives.

use crate::{
    config::PipelineConfig,
    error::{PipelineError, PipelineResult},
};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Read, path::Path};

/// One source row. `None` means the cell was empty or a null marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub channel:      Option<String>,
    pub created_at:   Option<String>,
    pub converted_at: Option<String>,
    pub product:      Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<RawRecord> for RawTable {
    fn from_iter<I: IntoIterator<Item = RawRecord>>(iter: I) -> Self {
        Self { rows: iter.into_iter().collect() }
    }
}

/// Open `path` and read it as CSV.
pub fn load_csv(path: impl AsRef<Path>, config: &PipelineConfig) -> PipelineResult<RawTable> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::DataUnavailable {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    let table = read_csv(file, config)?;
    log::info!("Loaded {} raw rows from {}", table.len(), path.display());
    Ok(table)
}

/// Read CSV text from any reader. The header row must name every
/// configured column; extra columns are ignored.
pub fn read_csv<R: Read>(reader: R, config: &PipelineConfig) -> PipelineResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{FEFF}').trim().to_string())
        .collect();

    let position = |name: &str| headers.iter().position(|h| h == name);
    let missing: Vec<String> = config
        .columns
        .required()
        .iter()
        .filter(|name| position(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::DataMalformed { missing });
    }

    // Presence checked above.
    let idx_channel   = position(&config.columns.channel).unwrap_or_default();
    let idx_created   = position(&config.columns.created_at).unwrap_or_default();
    let idx_converted = position(&config.columns.converted_at).unwrap_or_default();
    let idx_product   = position(&config.columns.product).unwrap_or_default();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cell = |i: usize| -> Option<String> {
            record
                .get(i)
                .filter(|v| !config.is_missing(v))
                .map(str::to_string)
        };
        rows.push(RawRecord {
            channel:      cell(idx_channel),
            created_at:   cell(idx_created),
            converted_at: cell(idx_converted),
            product:      cell(idx_product),
        });
    }
    Ok(RawTable { rows })
}
