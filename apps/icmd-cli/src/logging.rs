use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

use crate::error::{CliError, CliResult};

pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global stderr subscriber. Stdout stays reserved for CSV.
pub fn setup_logging(verbosity: u8, quiet: bool) -> CliResult<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(level_for(verbosity, quiet))
        .with(stderr_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
