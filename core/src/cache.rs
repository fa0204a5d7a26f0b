//! Dataset cache keyed on the source file's modification time.
//!
//! RULE: callers get the canonical dataset only through `DatasetCache`.
//! A reload happens when the source mtime changes or after `invalidate()`.

use crate::{
    config::PipelineConfig,
    dataset::Dataset,
    error::{PipelineError, PipelineResult},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

struct CachedDataset {
    modified: Option<SystemTime>,
    dataset:  Arc<Dataset>,
}

pub struct DatasetCache {
    path:   PathBuf,
    config: PipelineConfig,
    cached: Option<CachedDataset>,
    loads:  u64,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>, config: PipelineConfig) -> Self {
        Self {
            path: path.into(),
            config,
            cached: None,
            loads: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// How many times the source has been loaded.
    pub fn load_count(&self) -> u64 {
        self.loads
    }

    /// Return the cached dataset, reloading if the source changed.
    ///
    /// A failed reload drops the cached entry and returns the error;
    /// no stale or partial dataset is handed out afterwards.
    pub fn dataset(&mut self) -> PipelineResult<Arc<Dataset>> {
        let modified = match self.source_mtime() {
            Ok(m) => m,
            Err(e) => {
                self.cached = None;
                return Err(e);
            }
        };

        if let Some(cached) = &self.cached {
            if cached.modified == modified {
                return Ok(Arc::clone(&cached.dataset));
            }
            log::info!("Source {} changed; reloading", self.path.display());
        }

        self.cached = None;
        let dataset = Arc::new(Dataset::from_csv(&self.path, &self.config)?);
        self.loads += 1;
        self.cached = Some(CachedDataset {
            modified,
            dataset: Arc::clone(&dataset),
        });
        Ok(dataset)
    }

    /// Force the next `dataset()` call to reload.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    fn source_mtime(&self) -> PipelineResult<Option<SystemTime>> {
        match std::fs::metadata(&self.path) {
            // Platforms without mtime fall back to "never changed".
            Ok(meta) => Ok(meta.modified().ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PipelineError::DataUnavailable {
                    path: self.path.display().to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
