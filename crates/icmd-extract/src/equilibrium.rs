//! Equilibrium / temperature-step property extraction.

use icmd_core::{PressureUnit, TemperatureUnit};
use icmd_document::{Parameter, StepValue};

use crate::error::ExtractResult;
use crate::model_view::ModelView;
use crate::phases::{PhaseTemperatureExtractor, TEMPERATURE_ALIASES};
use crate::types::{PhaseTable, PropertySeries, TemperatureSeries};

pub const DENSITY_ALIASES: [&str; 3] = ["density", "system.density", "system_density"];
pub const ENTHALPY_ALIASES: [&str; 2] = ["enthalpy", "system.enthalpy"];
pub const PRESSURE_ALIASES: [&str; 2] = ["pressure", "system.pressure"];

#[derive(Debug, Clone, Copy)]
pub struct Equilibrium<'a> {
    view: ModelView<'a>,
}

impl<'a> Equilibrium<'a> {
    pub fn new(view: ModelView<'a>) -> Self {
        Self { view }
    }

    pub fn system_density(&self) -> ExtractResult<PropertySeries> {
        let param = self.view.first_parameter(&DENSITY_ALIASES)?;
        Ok(property("Density", None, param, |v| v))
    }

    pub fn enthalpy(&self) -> ExtractResult<PropertySeries> {
        let param = self.view.first_parameter(&ENTHALPY_ALIASES)?;
        Ok(property("Enthalpy", None, param, |v| v))
    }

    /// Pressure per step, converted from the model's source unit.
    pub fn pressure(&self, unit: PressureUnit) -> ExtractResult<PropertySeries> {
        let param = self.view.first_parameter(&PRESSURE_ALIASES)?;
        let source = self.view.units().pressure;
        Ok(property("Pressure", Some(unit.symbol()), param, |v| {
            source.convert(v, unit)
        }))
    }

    /// Every reported temperature, independent of phase data.
    pub fn temperatures(&self, unit: TemperatureUnit) -> ExtractResult<TemperatureSeries> {
        let param = self.view.first_parameter(&TEMPERATURE_ALIASES)?;
        let source = self.view.units().temperature;
        Ok(TemperatureSeries {
            unit,
            steps: param.steps().collect(),
            values: param
                .values
                .iter()
                .map(|sv| source.convert(sv.value, unit))
                .collect(),
            dropped: Vec::new(),
        })
    }

    pub fn phase_fraction_table(&self, unit: TemperatureUnit) -> ExtractResult<PhaseTable> {
        PhaseTemperatureExtractor::new(self.view)?.phase_fraction_table(unit)
    }

    pub fn volume_fraction_table(&self, unit: TemperatureUnit) -> ExtractResult<PhaseTable> {
        PhaseTemperatureExtractor::volume_fractions(self.view)?.phase_fraction_table(unit)
    }
}

fn property<F>(name: &str, unit: Option<&str>, param: &Parameter, convert: F) -> PropertySeries
where
    F: Fn(f64) -> f64,
{
    PropertySeries {
        name: name.to_string(),
        unit: unit.map(str::to_string),
        points: param
            .values
            .iter()
            .map(|sv| StepValue {
                step: sv.step,
                value: convert(sv.value),
            })
            .collect(),
    }
}
