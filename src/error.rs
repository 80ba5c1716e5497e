//! Error types for Tensio

use thiserror::Error;

/// Errors that can occur while running the analysis pipeline
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("CSV header is missing required column(s): {0}")]
    MissingColumns(String),

    #[error("no usable readings after parsing")]
    NoUsableData,

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
