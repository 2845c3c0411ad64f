//! Parameter studies: one phase-fraction table per input composition.
//!
//! A study model carries several samples, each a full calculation for one
//! entry of `attrs.input_dict.composition.components`. [`StudyTable::slice`]
//! picks the sample closest to a requested composition.

use tracing::{debug, warn};

use icmd_core::TemperatureUnit;

use crate::error::{ExtractError, ExtractResult};
use crate::model_view::ModelView;
use crate::phases::PhaseTemperatureExtractor;
use crate::types::{StudyBlock, StudySlice, StudyTable};

/// Total of a composition given in percent.
pub const COMPOSITION_TOTAL: f64 = 100.0;
/// Compositions are compared after rounding to this many decimals.
pub const COMPOSITION_DECIMALS: i32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct ParameterStudy<'a> {
    view: ModelView<'a>,
}

impl<'a> ParameterStudy<'a> {
    pub fn new(view: ModelView<'a>) -> ExtractResult<Self> {
        if view.samples().is_empty() {
            return Err(ExtractError::ParameterNotFound {
                model: view.name().to_string(),
                name: "samples".to_string(),
            });
        }
        Ok(Self { view })
    }

    pub fn len(&self) -> usize {
        self.view.samples().len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.samples().is_empty()
    }

    /// Aligned phase fractions of every sample, each tagged with its input
    /// composition.
    pub fn table(&self, unit: TemperatureUnit) -> ExtractResult<StudyTable> {
        let inputs = self.view.inputs();
        let mut blocks = Vec::with_capacity(self.len());

        for (i, sample) in self.view.samples().iter().enumerate() {
            let composition = inputs
                .iter()
                .map(|c| {
                    c.samples
                        .get(i)
                        .copied()
                        .ok_or_else(|| ExtractError::ParameterNotFound {
                            model: self.view.name().to_string(),
                            name: format!("{}[sample {}]", c.name, i),
                        })
                })
                .collect::<ExtractResult<Vec<f64>>>()?;

            let phases = sample
                .phase_fractions
                .iter()
                .map(|p| (p.name.as_str(), p))
                .collect();
            let table =
                PhaseTemperatureExtractor::from_parts(self.view, &sample.temperature, phases)
                    .phase_fraction_table(unit)?;
            blocks.push(StudyBlock {
                sample: i,
                composition,
                table,
            });
        }

        debug!(
            model = self.view.name(),
            samples = blocks.len(),
            "extracted parameter study"
        );
        Ok(StudyTable {
            model: self.view.name().to_string(),
            temperature_unit: unit,
            components: inputs.iter().map(|c| c.name.clone()).collect(),
            phases: self.view.phase_names().to_vec(),
            blocks,
        })
    }
}

impl StudyTable {
    /// The sample whose input composition is nearest to `target`.
    ///
    /// Every component must be given except `balance`, which takes
    /// `100 - sum(target)` (never below zero). Amounts are rounded to
    /// [`COMPOSITION_DECIMALS`] and compared by Euclidean distance; an
    /// exact match has distance zero and ties go to the earlier sample.
    pub fn slice(
        &self,
        target: &[(&str, f64)],
        balance: Option<&str>,
    ) -> ExtractResult<StudySlice> {
        let is_component = |name: &str| self.components.iter().any(|c| c == name);
        if let Some(name) = target
            .iter()
            .map(|(name, _)| *name)
            .chain(balance)
            .find(|name| !is_component(name))
        {
            return Err(self.not_found(name));
        }

        let given: f64 = target.iter().map(|(_, v)| v).sum();
        let wanted = self
            .components
            .iter()
            .map(|component| {
                if Some(component.as_str()) == balance {
                    return Ok((component.clone(), (COMPOSITION_TOTAL - given).max(0.0)));
                }
                target
                    .iter()
                    .find(|(name, _)| *name == component.as_str())
                    .map(|(_, v)| (component.clone(), *v))
                    .ok_or_else(|| self.not_found(component))
            })
            .collect::<ExtractResult<Vec<_>>>()?;

        let key: Vec<f64> = wanted.iter().map(|(_, v)| round(*v)).collect();
        let mut best: Option<(&StudyBlock, f64)> = None;
        for block in &self.blocks {
            let distance = key
                .iter()
                .zip(&block.composition)
                .map(|(a, b)| (a - round(*b)).powi(2))
                .sum::<f64>()
                .sqrt();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((block, distance));
            }
        }
        let (block, distance) = best.ok_or_else(|| self.not_found("samples"))?;

        if distance > 0.0 {
            warn!(
                model = self.model.as_str(),
                sample = block.sample,
                distance = distance,
                "no sample matches the requested composition exactly, using the nearest"
            );
        }
        Ok(StudySlice {
            sample: block.sample,
            target: wanted,
            balance: balance.map(str::to_string),
            matched: block.composition.clone(),
            table: block.table.clone(),
        })
    }

    fn not_found(&self, name: &str) -> ExtractError {
        ExtractError::ParameterNotFound {
            model: self.model.clone(),
            name: name.to_string(),
        }
    }
}

fn round(value: f64) -> f64 {
    let scale = 10f64.powi(COMPOSITION_DECIMALS);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    const STUDY: &str = r#"{
        "study": {
            "coords": { "phase": { "data": ["LIQUID", "FCC_A1"] } },
            "data_vars": {
                "temperature_values": { "data": [
                    [[650.0, 923.15, 1202.0], [600.0, 873.15, 1112.0]],
                    [[640.0, 913.15, 1184.0], [590.0, 863.15, 1094.0]],
                    [[630.0, 903.15, 1166.0], [580.0, 853.15, 1076.0]]
                ] },
                "phase_fraction": { "data": [
                    [[[1.0, 1.0], [0.0, 0.0]], [[0.3, 0.3], [0.7, 0.7]]],
                    [[[1.0, 1.0], [0.0, 0.0]], [[0.2, 0.2], [0.8, 0.8]]],
                    [[[1.0, 1.0], [0.0, 0.0]], [[0.1, 0.1], [0.9, 0.9]]]
                ] }
            },
            "attrs": { "input_dict": { "composition": { "components": [
                { "name": "Al", "samples": [98.5, 97.5, 96.0] },
                { "name": "Mg", "samples": [1.0, 2.0, 3.0] },
                { "name": "Si", "samples": [0.5, 0.5, 1.0] }
            ] } } }
        }
    }"#;

    fn study() -> StudyTable {
        let catalog = Catalog::from_json_str("study", STUDY).unwrap();
        catalog
            .parameter_study("study")
            .unwrap()
            .table(TemperatureUnit::Celsius)
            .unwrap()
    }

    #[test]
    fn every_sample_gets_its_own_block() {
        let table = study();
        assert_eq!(table.components, vec!["Al", "Mg", "Si"]);
        assert_eq!(table.phases, vec!["LIQUID", "FCC_A1"]);
        assert_eq!(table.blocks.len(), 3);
        assert_eq!(table.blocks[2].composition, vec![96.0, 3.0, 1.0]);
        assert_eq!(table.blocks[2].table.rows[1].temperature, 580.0);
        assert_eq!(table.blocks[2].table.rows[1].fractions, vec![0.1, 0.9]);
        assert_eq!(table.blocks[1].table.rows[0].fractions, vec![1.0, 0.0]);
    }

    #[test]
    fn exact_composition_selects_its_sample() {
        let slice = study()
            .slice(&[("Mg", 2.0), ("Si", 0.5)], Some("Al"))
            .unwrap();
        assert_eq!(slice.sample, 1);
        assert_eq!(
            slice.target,
            vec![
                ("Al".to_string(), 97.5),
                ("Mg".to_string(), 2.0),
                ("Si".to_string(), 0.5)
            ]
        );
        assert_eq!(slice.label(), "Mg=2.00,Si=0.50");
        assert_eq!(slice.table.rows[1].fractions, vec![0.2, 0.8]);
    }

    #[test]
    fn off_grid_composition_uses_the_nearest_sample() {
        let slice = study()
            .slice(&[("Mg", 2.9), ("Si", 0.9)], Some("Al"))
            .unwrap();
        assert_eq!(slice.sample, 2);
        assert_eq!(slice.matched, vec![96.0, 3.0, 1.0]);
    }

    #[test]
    fn rounding_absorbs_float_noise() {
        let slice = study()
            .slice(&[("Mg", 1.0000001), ("Si", 0.4999999)], Some("Al"))
            .unwrap();
        assert_eq!(slice.sample, 0);
    }

    #[test]
    fn every_component_but_the_balance_is_required() {
        let err = study().slice(&[("Mg", 2.0)], Some("Al")).unwrap_err();
        assert!(matches!(err, ExtractError::ParameterNotFound { ref name, .. } if name == "Si"));

        let err = study()
            .slice(&[("Mg", 2.0), ("Si", 0.5), ("Zn", 1.0)], Some("Al"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::ParameterNotFound { ref name, .. } if name == "Zn"));
    }

    #[test]
    fn balance_never_goes_negative() {
        let slice = study()
            .slice(&[("Mg", 80.0), ("Si", 30.0)], Some("Al"))
            .unwrap();
        assert_eq!(slice.target[0], ("Al".to_string(), 0.0));
    }

    #[test]
    fn plain_models_are_not_studies() {
        let catalog = Catalog::from_json_str(
            "single",
            r#"{"models": {"single": {"parameters": {
                "temperature": [700], "phase_fraction": { "LIQUID": [1.0] }
            }}}}"#,
        )
        .unwrap();
        let err = catalog.parameter_study("single").unwrap_err();
        assert!(matches!(err, ExtractError::ParameterNotFound { ref name, .. } if name == "samples"));
    }
}
