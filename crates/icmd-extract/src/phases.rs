//! Step-aligned phase fractions and temperatures.
//!
//! Alignment policy: a step is kept only when the temperature parameter
//! and at least one phase report a value there. Steps seen in just one
//! source are dropped from every output and listed in `dropped`, so a
//! shortened series is always detectable. Phase fraction and temperature
//! extraction share [`PhaseTemperatureExtractor::alignment`].

use std::collections::BTreeSet;

use icmd_core::TemperatureUnit;
use icmd_document::{Parameter, Step};
use tracing::{debug, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::model_view::ModelView;
use crate::types::{
    DroppedStep, MissingSide, PhaseColumn, PhaseFractionSeries, PhaseRow, PhaseTable,
    StepAlignment, TemperatureSeries,
};

pub const TEMPERATURE_ALIASES: [&str; 3] =
    ["temperature", "temperature_values", "system.temperature"];
pub const PHASE_GROUP_ALIASES: [&str; 2] = ["phase_fraction", "phase_fractions"];
pub const VOLUME_GROUP_ALIASES: [&str; 2] = ["volume_fraction", "volume_fractions"];

/// Fraction reported for a phase that is absent at an aligned step.
pub const ABSENT_PHASE_FRACTION: f64 = 0.0;

#[derive(Debug, Clone)]
pub struct PhaseTemperatureExtractor<'a> {
    view: ModelView<'a>,
    temperature: &'a Parameter,
    phases: Vec<(&'a str, &'a Parameter)>,
}

impl<'a> PhaseTemperatureExtractor<'a> {
    /// Phase fractions (`phase_fraction.*`) against temperature.
    pub fn new(view: ModelView<'a>) -> ExtractResult<Self> {
        Self::with_group(view, &PHASE_GROUP_ALIASES)
    }

    /// Volume fractions (`volume_fraction.*`) against temperature.
    pub fn volume_fractions(view: ModelView<'a>) -> ExtractResult<Self> {
        Self::with_group(view, &VOLUME_GROUP_ALIASES)
    }

    fn with_group(view: ModelView<'a>, group_aliases: &[&str]) -> ExtractResult<Self> {
        let temperature = view.first_parameter(&TEMPERATURE_ALIASES)?;
        let phases = view.first_group(group_aliases)?;
        Ok(Self::from_parts(view, temperature, phases))
    }

    /// Extractor over explicit series, e.g. one sample of a parameter
    /// study. Temperatures are read in the model's source unit.
    pub fn from_parts(
        view: ModelView<'a>,
        temperature: &'a Parameter,
        phases: Vec<(&'a str, &'a Parameter)>,
    ) -> Self {
        Self {
            view,
            temperature,
            phases,
        }
    }

    pub fn view(&self) -> ModelView<'a> {
        self.view
    }

    /// Every phase reported at any step, in source order.
    pub fn phase_names(&self) -> Vec<&'a str> {
        self.phases.iter().map(|(name, _)| *name).collect()
    }

    pub fn alignment(&self) -> ExtractResult<StepAlignment> {
        let temp_steps: BTreeSet<Step> = self.temperature.steps().collect();
        let phase_steps: BTreeSet<Step> = self
            .phases
            .iter()
            .flat_map(|(_, p)| p.steps())
            .collect();

        let mut alignment = StepAlignment::default();
        for &step in temp_steps.union(&phase_steps) {
            match (temp_steps.contains(&step), phase_steps.contains(&step)) {
                (true, true) => alignment.steps.push(step),
                (true, false) => alignment.dropped.push(DroppedStep {
                    step,
                    missing: MissingSide::PhaseData,
                }),
                _ => alignment.dropped.push(DroppedStep {
                    step,
                    missing: MissingSide::Temperature,
                }),
            }
        }

        if alignment.steps.is_empty() {
            return Err(ExtractError::EmptyAlignment {
                model: self.view.name().to_string(),
                dropped: alignment.dropped.len(),
            });
        }
        if !alignment.dropped.is_empty() {
            warn!(
                model = self.view.name(),
                kept = alignment.steps.len(),
                dropped = alignment.dropped.len(),
                "dropped steps without both temperature and phase data"
            );
        }
        debug!(
            model = self.view.name(),
            steps = alignment.steps.len(),
            "aligned phase and temperature steps"
        );
        Ok(alignment)
    }

    pub fn phase_fraction(&self) -> ExtractResult<PhaseFractionSeries> {
        let alignment = self.alignment()?;
        Ok(PhaseFractionSeries {
            phases: self.columns_at(&alignment.steps),
            steps: alignment.steps,
            dropped: alignment.dropped,
        })
    }

    /// Temperatures at the aligned steps, converted from the model's
    /// source unit.
    pub fn temperatures(&self, unit: TemperatureUnit) -> ExtractResult<TemperatureSeries> {
        let alignment = self.alignment()?;
        Ok(TemperatureSeries {
            unit,
            values: self.temperatures_at(&alignment.steps, unit)?,
            steps: alignment.steps,
            dropped: alignment.dropped,
        })
    }

    /// Rectangular form: one row per aligned step.
    pub fn phase_fraction_table(&self, unit: TemperatureUnit) -> ExtractResult<PhaseTable> {
        let alignment = self.alignment()?;
        let columns = self.columns_at(&alignment.steps);
        let temperatures = self.temperatures_at(&alignment.steps, unit)?;

        let rows = alignment
            .steps
            .iter()
            .zip(temperatures)
            .enumerate()
            .map(|(i, (&step, temperature))| PhaseRow {
                step,
                temperature,
                fractions: columns.iter().map(|c| c.fractions[i]).collect(),
            })
            .collect();

        Ok(PhaseTable {
            temperature_unit: unit,
            phases: columns.into_iter().map(|c| c.name).collect(),
            rows,
            dropped: alignment.dropped,
        })
    }

    fn columns_at(&self, steps: &[Step]) -> Vec<PhaseColumn> {
        self.phases
            .iter()
            .map(|(name, p)| PhaseColumn {
                name: (*name).to_string(),
                fractions: steps
                    .iter()
                    .map(|&s| p.value_at(s).unwrap_or(ABSENT_PHASE_FRACTION))
                    .collect(),
            })
            .collect()
    }

    fn temperatures_at(&self, steps: &[Step], unit: TemperatureUnit) -> ExtractResult<Vec<f64>> {
        let source = self.view.units().temperature;
        steps
            .iter()
            .map(|&step| {
                // Aligned steps come from the temperature parameter itself.
                let raw = self.temperature.value_at(step).ok_or_else(|| {
                    ExtractError::ParameterNotFound {
                        model: self.view.name().to_string(),
                        name: format!("{}[step {}]", self.temperature.name, step),
                    }
                })?;
                Ok(source.convert(raw, unit))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    const SCENARIO: &str = r#"{
        "models": {
            "model1": {
                "steps": [0, 1, 2],
                "parameters": {
                    "temperature": [1500, 1400, 1300],
                    "phase_fraction": { "liquid": [1.0, 0.5, 0.0], "solid": [0.0, 0.5, 1.0] }
                }
            },
            "ragged": {
                "parameters": {
                    "temperature": { "steps": [0, 1, 2, 4], "values": [900, 850, 800, 700] },
                    "phase_fraction": {
                        "LIQUID": { "steps": [0, 1, 3, 4], "values": [1.0, 0.7, 0.2, 0.0] },
                        "FCC_A1": { "steps": [1, 3, 4], "values": [0.3, 0.8, 1.0] }
                    }
                }
            },
            "disjoint": {
                "parameters": {
                    "temperature": { "steps": [0], "values": [900] },
                    "phase_fraction": { "LIQUID": { "steps": [5], "values": [1.0] } }
                }
            },
            "no_phases": { "parameters": { "temperature": [1, 2] } }
        }
    }"#;

    fn catalog() -> Catalog {
        Catalog::from_json_str("inline", SCENARIO).unwrap()
    }

    #[test]
    fn scenario_series_are_aligned() {
        let catalog = catalog();
        let ex = PhaseTemperatureExtractor::new(catalog.get_model("model1").unwrap()).unwrap();
        let phases = ex.phase_fraction().unwrap();
        let temps = ex.temperatures(TemperatureUnit::Celsius).unwrap();

        assert_eq!(phases.steps, vec![0, 1, 2]);
        assert_eq!(temps.steps, phases.steps);
        assert_eq!(temps.values, vec![1500.0, 1400.0, 1300.0]);
        assert_eq!(phases.phase("liquid").unwrap().fractions, vec![1.0, 0.5, 0.0]);
        assert_eq!(phases.phase("solid").unwrap().fractions, vec![0.0, 0.5, 1.0]);
        assert!(phases.dropped.is_empty());
    }

    #[test]
    fn steps_missing_on_one_side_are_dropped_and_reported() {
        let catalog = catalog();
        let ex = PhaseTemperatureExtractor::new(catalog.get_model("ragged").unwrap()).unwrap();
        let phases = ex.phase_fraction().unwrap();
        let temps = ex.temperatures(TemperatureUnit::Celsius).unwrap();

        assert_eq!(phases.steps, vec![0, 1, 4]);
        assert_eq!(temps.steps, phases.steps);
        assert_eq!(temps.values.len(), phases.len());
        assert_eq!(
            phases.dropped,
            vec![
                DroppedStep { step: 2, missing: MissingSide::PhaseData },
                DroppedStep { step: 3, missing: MissingSide::Temperature },
            ]
        );
        assert_eq!(temps.dropped, phases.dropped);
    }

    #[test]
    fn absent_phase_is_reported_as_zero() {
        let catalog = catalog();
        let ex = PhaseTemperatureExtractor::new(catalog.get_model("ragged").unwrap()).unwrap();
        let phases = ex.phase_fraction().unwrap();
        let fcc = phases.phase("FCC_A1").unwrap();
        assert_eq!(fcc.fractions, vec![ABSENT_PHASE_FRACTION, 0.3, 1.0]);
    }

    #[test]
    fn disjoint_sources_fail_instead_of_returning_empty() {
        let catalog = catalog();
        let ex = PhaseTemperatureExtractor::new(catalog.get_model("disjoint").unwrap()).unwrap();
        let err = ex.phase_fraction().unwrap_err();
        assert!(matches!(err, ExtractError::EmptyAlignment { dropped: 2, .. }));
    }

    #[test]
    fn missing_phase_group_is_parameter_not_found() {
        let catalog = catalog();
        let err = PhaseTemperatureExtractor::new(catalog.get_model("no_phases").unwrap())
            .unwrap_err();
        assert!(matches!(err, ExtractError::ParameterNotFound { .. }));
    }

    #[test]
    fn temperatures_convert_to_kelvin() {
        let catalog = catalog();
        let ex = PhaseTemperatureExtractor::new(catalog.get_model("model1").unwrap()).unwrap();
        let temps = ex.temperatures(TemperatureUnit::Kelvin).unwrap();
        assert!((temps.values[0] - 1773.15).abs() < 1e-9);
        assert_eq!(temps.unit, TemperatureUnit::Kelvin);
    }

    #[test]
    fn volume_fractions_align_like_phase_fractions() {
        let catalog = Catalog::from_json_str(
            "inline",
            r#"{"models": {"m": {"parameters": {
                "temperature": [700, 650],
                "phase_fraction": { "LIQUID": [1.0, 0.5], "FCC_A1": [0.0, 0.5] },
                "volume_fraction": { "LIQUID": [1.0, 0.52], "FCC_A1": [0.0, 0.48] }
            }}}}"#,
        )
        .unwrap();
        let ex = PhaseTemperatureExtractor::volume_fractions(catalog.get_model("m").unwrap())
            .unwrap();
        let table = ex.phase_fraction_table(TemperatureUnit::Celsius).unwrap();
        assert_eq!(table.phases, vec!["LIQUID", "FCC_A1"]);
        assert_eq!(table.rows[1].fractions, vec![0.52, 0.48]);
    }

    #[test]
    fn phase_table_warns_once_about_dropped_steps() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tracing::{Event, Level, Subscriber};
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        struct WarnCounter(Arc<AtomicUsize>);

        impl<S: Subscriber> Layer<S> for WarnCounter {
            fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
                if *event.metadata().level() == Level::WARN {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));
        let catalog = catalog();
        let ex = PhaseTemperatureExtractor::new(catalog.get_model("ragged").unwrap()).unwrap();

        let table = tracing::subscriber::with_default(subscriber, || {
            ex.phase_fraction_table(TemperatureUnit::Celsius).unwrap()
        });
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.dropped.len(), 2);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn phase_table_rows_pair_temperature_with_fractions() {
        let catalog = catalog();
        let ex = PhaseTemperatureExtractor::new(catalog.get_model("model1").unwrap()).unwrap();
        let table = ex.phase_fraction_table(TemperatureUnit::Celsius).unwrap();
        assert_eq!(table.phases, vec!["liquid", "solid"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1].temperature, 1400.0);
        assert_eq!(table.rows[1].fractions, vec![0.5, 0.5]);
        assert_eq!(table.temperature_label(), "Temperature in C");
    }
}
