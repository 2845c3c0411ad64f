//! Error types for chart export.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode chart: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PlotResult<T> = Result<T, PlotError>;
