//! Optional YAML defaults for the CLI.
//!
//! ```yaml
//! temperature-unit: K
//! pressure-unit: atm
//! basis: mass
//! threshold: 1.0e-5
//! log-y: false
//! plot-width: 900
//! plot-height: 600
//! ```
//!
//! Command-line flags override file values; anything unset falls back to
//! the library defaults.

use std::path::Path;

use icmd_extract::{FractionBasis, LoadOptions, PressureUnit, ScheilOptions, TemperatureUnit};
use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, CliResult};

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    #[serde(default)]
    pub temperature_unit: Option<String>,
    #[serde(default)]
    pub pressure_unit: Option<String>,
    #[serde(default)]
    pub basis: Option<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub log_y: Option<bool>,
    #[serde(default)]
    pub plot_width: Option<u32>,
    #[serde(default)]
    pub plot_height: Option<u32>,
}

impl FileConfig {
    pub fn from_yaml_str(path: &Path, text: &str) -> CliResult<Self> {
        serde_yaml::from_str(text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(path, &text)?;
        debug!(path = %path.display(), "loaded cli config");
        Ok(config)
    }
}

/// Values given on the command line.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Overrides {
    pub temperature_unit: Option<String>,
    pub pressure_unit: Option<String>,
    pub basis: Option<String>,
    pub threshold: Option<f64>,
    pub linear_y: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub temperature_unit: TemperatureUnit,
    pub pressure_unit: PressureUnit,
    pub basis: FractionBasis,
    pub scheil: ScheilOptions,
    pub log_y: bool,
    pub plot_size: Option<(u32, u32)>,
}

impl Settings {
    pub fn resolve(file: &FileConfig, overrides: &Overrides) -> CliResult<Self> {
        let temperature_unit = match overrides
            .temperature_unit
            .as_deref()
            .or(file.temperature_unit.as_deref())
        {
            Some(s) => s.parse()?,
            None => TemperatureUnit::default(),
        };
        let pressure_unit = match overrides
            .pressure_unit
            .as_deref()
            .or(file.pressure_unit.as_deref())
        {
            Some(s) => s.parse()?,
            None => PressureUnit::default(),
        };
        let basis = match overrides.basis.as_deref().or(file.basis.as_deref()) {
            Some(s) => s.parse()?,
            None => FractionBasis::default(),
        };

        let mut scheil = ScheilOptions::default();
        if let Some(threshold) = overrides.threshold.or(file.threshold) {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(CliError::Argument(format!(
                    "threshold must be a non-negative number, got {threshold}"
                )));
            }
            scheil.threshold = threshold;
        }

        let log_y = !overrides.linear_y && file.log_y.unwrap_or(true);
        let plot_size = match (file.plot_width, file.plot_height) {
            (Some(w), Some(h)) => Some((w, h)),
            (None, None) => None,
            _ => {
                return Err(CliError::Argument(
                    "plot-width and plot-height must be set together".to_string(),
                ));
            }
        };

        Ok(Self {
            temperature_unit,
            pressure_unit,
            basis,
            scheil,
            log_y,
            plot_size,
        })
    }

    /// Dataset columns to read: the requested basis, and the temperature
    /// column matching the output unit.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            basis: self.basis,
            temperature_column: self.temperature_unit,
        }
    }
}
