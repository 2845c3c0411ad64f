//! Scheil solidification tables.
//!
//! The solidified fraction comes from the first available source: an
//! explicit parameter ([`FRACTION_SOLID_ALIASES`], scaled by 100 when its
//! name says percent), the aggregate `SOLID` column, `1 - LIQUID`, or the
//! sum of all phases. With an explicit parameter, aligned steps it does
//! not cover are dropped and reported instead of falling back to a
//! derived value.

use std::collections::HashMap;

use icmd_core::TemperatureUnit;
use icmd_document::dataset::REGION_TEMPERATURE_VAR;
use icmd_document::{Step, join_path};
use tracing::warn;

use crate::error::{ExtractError, ExtractResult};
use crate::model_view::ModelView;
use crate::phases::PhaseTemperatureExtractor;
use crate::types::{
    DroppedStep, MissingSide, PhaseTable, PropertySeries, RegionTemperatureRow,
    RegionTemperatureTable, ScheilRow, ScheilTable,
};

/// Explicit solidified-fraction parameters, checked in order.
pub const FRACTION_SOLID_ALIASES: [&str; 4] = [
    "fraction_solid",
    "percent_solidified",
    "percent_solidified_molar",
    "percent_solidified_molar_values",
];

pub const PERCENT_SOLIDIFIED_ALIASES: [&str; 2] =
    ["percent_solidified_molar_values", "percent_solidified_molar"];

/// Aggregate column some models report next to the individual phases.
/// Matched exactly: a phase called `solid` is an ordinary phase.
pub const SOLID_PHASE: &str = "SOLID";
pub const LIQUID_PHASE: &str = "LIQUID";

/// Region of a step where no phase is above the threshold.
pub const NO_PHASE_REGION: &str = "none";

pub const DEFAULT_REGION_THRESHOLD: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheilOptions {
    /// A phase counts as present when its fraction exceeds this.
    pub threshold: f64,
}

impl Default for ScheilOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_REGION_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Solidification<'a> {
    phases: PhaseTemperatureExtractor<'a>,
}

impl<'a> Solidification<'a> {
    pub fn new(view: ModelView<'a>) -> ExtractResult<Self> {
        Ok(Self {
            phases: PhaseTemperatureExtractor::new(view)?,
        })
    }

    pub fn phases(&self) -> &PhaseTemperatureExtractor<'a> {
        &self.phases
    }

    /// Scheil table with the default region threshold.
    pub fn data_for_scheil_plot(&self, unit: TemperatureUnit) -> ExtractResult<ScheilTable> {
        self.scheil_table(unit, ScheilOptions::default())
    }

    pub fn scheil_table(
        &self,
        unit: TemperatureUnit,
        options: ScheilOptions,
    ) -> ExtractResult<ScheilTable> {
        let table = self.phases.phase_fraction_table(unit)?;
        let explicit = self.explicit_fraction_solid();
        let solid_idx = solid_column(&table.phases);
        let liquid_idx = liquid_column(&table.phases);

        let mut dropped = table.dropped;
        let mut uncovered = 0;
        let mut rows = Vec::with_capacity(table.rows.len());
        for row in table.rows {
            let fraction_solid = match &explicit {
                Some(by_step) => match by_step.get(&row.step) {
                    Some(&value) => value,
                    None => {
                        uncovered += 1;
                        dropped.push(DroppedStep {
                            step: row.step,
                            missing: MissingSide::FractionSolid,
                        });
                        continue;
                    }
                },
                None => derived_fraction_solid(&row.fractions, solid_idx, liquid_idx),
            };
            rows.push(ScheilRow {
                step: row.step,
                temperature: row.temperature,
                phase_region: phase_region(
                    &table.phases,
                    &row.fractions,
                    solid_idx,
                    options.threshold,
                ),
                fractions: row.fractions,
                fraction_solid,
            });
        }
        dropped.sort_by_key(|d| d.step);

        let model = self.phases.view().name();
        if rows.is_empty() {
            return Err(ExtractError::EmptyAlignment {
                model: model.to_string(),
                dropped: dropped.len(),
            });
        }
        if uncovered > 0 {
            warn!(
                model = model,
                dropped = uncovered,
                "dropped steps the solidified fraction parameter does not cover"
            );
        }

        Ok(ScheilTable {
            temperature_unit: unit,
            phases: table.phases,
            rows,
            dropped,
        })
    }

    /// Phase region per aligned step.
    pub fn phase_regions(&self, threshold: f64) -> ExtractResult<Vec<(Step, String)>> {
        let table: PhaseTable = self.phases.phase_fraction_table(TemperatureUnit::default())?;
        let solid_idx = solid_column(&table.phases);
        Ok(table
            .rows
            .iter()
            .map(|row| {
                (
                    row.step,
                    phase_region(&table.phases, &row.fractions, solid_idx, threshold),
                )
            })
            .collect())
    }

    /// Volume fractions against temperature, aligned like phase fractions.
    pub fn volume_fraction_table(&self, unit: TemperatureUnit) -> ExtractResult<PhaseTable> {
        PhaseTemperatureExtractor::volume_fractions(self.phases.view())?.phase_fraction_table(unit)
    }

    /// Solidification regions named by the tool, in source order.
    pub fn solid_regions(&self) -> ExtractResult<&'a [String]> {
        let view = self.phases.view();
        match view.regions() {
            [] => Err(ExtractError::ParameterNotFound {
                model: view.name().to_string(),
                name: "solidification_region".to_string(),
            }),
            regions => Ok(regions),
        }
    }

    /// Temperature of each tool-reported region per step, converted from
    /// the model's source unit.
    pub fn temperature_by_phase_region(
        &self,
        unit: TemperatureUnit,
    ) -> ExtractResult<RegionTemperatureTable> {
        let view = self.phases.view();
        let regions = self.solid_regions()?;
        let params = regions
            .iter()
            .map(|region| view.parameter(&join_path(REGION_TEMPERATURE_VAR, region)))
            .collect::<ExtractResult<Vec<_>>>()?;
        let source = view.units().temperature;

        let rows = view
            .steps()
            .iter()
            .map(|&step| RegionTemperatureRow {
                step,
                temperatures: params
                    .iter()
                    .map(|p| p.value_at(step).map(|v| source.convert(v, unit)))
                    .collect(),
            })
            .collect();

        Ok(RegionTemperatureTable {
            temperature_unit: unit,
            regions: regions.to_vec(),
            rows,
        })
    }

    /// The tool's own region per step: the first non-liquid region with a
    /// temperature there. Steps with none (fully liquid) are left out.
    pub fn reported_phase_regions(&self) -> ExtractResult<Vec<(Step, String)>> {
        let table = self.temperature_by_phase_region(self.phases.view().units().temperature)?;
        Ok(table
            .rows
            .iter()
            .filter_map(|row| {
                table
                    .regions
                    .iter()
                    .zip(&row.temperatures)
                    .find(|(region, t)| region.as_str() != LIQUID_PHASE && t.is_some())
                    .map(|(region, _)| (row.step, region.clone()))
            })
            .collect())
    }

    /// Solidified percentage as the tool reports it, unscaled.
    pub fn percent_solidified_molar(&self) -> ExtractResult<PropertySeries> {
        let param = self
            .phases
            .view()
            .first_parameter(&PERCENT_SOLIDIFIED_ALIASES)?;
        Ok(PropertySeries {
            name: "Percent solidified molar".to_string(),
            unit: None,
            points: param.values.clone(),
        })
    }

    /// Explicit solidified fraction by step, scaled to 0..1.
    fn explicit_fraction_solid(&self) -> Option<HashMap<Step, f64>> {
        let param = self
            .phases
            .view()
            .first_parameter(&FRACTION_SOLID_ALIASES)
            .ok()?;
        let divisor = if param.name.contains("percent") {
            100.0
        } else {
            1.0
        };
        Some(
            param
                .values
                .iter()
                .map(|sv| (sv.step, sv.value / divisor))
                .collect(),
        )
    }
}

fn solid_column(phases: &[String]) -> Option<usize> {
    phases.iter().position(|p| p == SOLID_PHASE)
}

fn liquid_column(phases: &[String]) -> Option<usize> {
    phases.iter().position(|p| p.eq_ignore_ascii_case(LIQUID_PHASE))
}

/// SOLID column if present, else 1 - LIQUID, else the sum of all phases.
fn derived_fraction_solid(
    fractions: &[f64],
    solid_idx: Option<usize>,
    liquid_idx: Option<usize>,
) -> f64 {
    match (solid_idx, liquid_idx) {
        (Some(i), _) => fractions[i],
        (None, Some(i)) => 1.0 - fractions[i],
        (None, None) => fractions.iter().sum(),
    }
}

/// Present phases sorted and joined with `+`. Falls back to the aggregate
/// column when it is the only thing present, then to [`NO_PHASE_REGION`].
fn phase_region(
    phases: &[String],
    fractions: &[f64],
    solid_idx: Option<usize>,
    threshold: f64,
) -> String {
    let mut present: Vec<&str> = phases
        .iter()
        .zip(fractions)
        .enumerate()
        .filter(|(i, (_, f))| Some(*i) != solid_idx && **f > threshold)
        .map(|(_, (name, _))| name.as_str())
        .collect();
    if present.is_empty() {
        return match solid_idx {
            Some(i) if fractions[i] > threshold => SOLID_PHASE.to_string(),
            _ => NO_PHASE_REGION.to_string(),
        };
    }
    present.sort_unstable();
    present.join("+")
}
