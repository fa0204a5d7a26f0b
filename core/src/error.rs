use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source data not found: {path}")]
    DataUnavailable { path: String },

    #[error("Source data is missing expected columns: {}", .missing.join(", "))]
    DataMalformed { missing: Vec<String> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
