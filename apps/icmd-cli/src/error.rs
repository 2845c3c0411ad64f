use std::path::PathBuf;

use icmd_core::UnitError;
use icmd_extract::ExtractError;
use icmd_plot::PlotError;
use thiserror::Error;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Plot(#[from] PlotError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("Failed to parse config '{path}': {source}", path = path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to access '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Invalid argument: {0}")]
    Argument(String),
}
