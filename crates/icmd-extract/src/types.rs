//! Extracted series and tables.

use std::fmt;

use icmd_core::{FractionBasis, TemperatureUnit};
use icmd_document::{Step, StepValue};

/// Which source lacked data at a dropped step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSide {
    Temperature,
    PhaseData,
    /// An explicit solidified-fraction parameter has no value there.
    FractionSolid,
}

impl fmt::Display for MissingSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::PhaseData => write!(f, "phase data"),
            Self::FractionSolid => write!(f, "fraction solid"),
        }
    }
}

/// A step excluded from aligned output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedStep {
    pub step: Step,
    pub missing: MissingSide,
}

impl fmt::Display for DroppedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} (no {})", self.step, self.missing)
    }
}

/// Steps kept after aligning temperature and phase data, plus the ones
/// that were excluded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepAlignment {
    pub steps: Vec<Step>,
    pub dropped: Vec<DroppedStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseColumn {
    pub name: String,
    /// One value per aligned step.
    pub fractions: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseFractionSeries {
    pub steps: Vec<Step>,
    pub phases: Vec<PhaseColumn>,
    pub dropped: Vec<DroppedStep>,
}

impl PhaseFractionSeries {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseColumn> {
        self.phases.iter().find(|p| p.name == name)
    }

    pub fn phase_names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureSeries {
    pub unit: TemperatureUnit,
    pub steps: Vec<Step>,
    pub values: Vec<f64>,
    pub dropped: Vec<DroppedStep>,
}

impl TemperatureSeries {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseRow {
    pub step: Step,
    pub temperature: f64,
    /// Same order as [`PhaseTable::phases`].
    pub fractions: Vec<f64>,
}

/// Phase fractions against temperature, one row per aligned step.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTable {
    pub temperature_unit: TemperatureUnit,
    pub phases: Vec<String>,
    pub rows: Vec<PhaseRow>,
    pub dropped: Vec<DroppedStep>,
}

impl PhaseTable {
    pub fn phase_index(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|p| p == name)
    }

    pub fn temperature_label(&self) -> String {
        format!("Temperature in {}", self.temperature_unit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheilRow {
    pub step: Step,
    pub temperature: f64,
    pub fractions: Vec<f64>,
    pub fraction_solid: f64,
    /// Phases present at this step, sorted and joined with `+`.
    pub phase_region: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheilTable {
    pub temperature_unit: TemperatureUnit,
    pub phases: Vec<String>,
    pub rows: Vec<ScheilRow>,
    pub dropped: Vec<DroppedStep>,
}

impl ScheilTable {
    pub fn temperature_label(&self) -> String {
        format!("Temperature in {}", self.temperature_unit)
    }
}

/// A scalar property over steps (density, enthalpy, pressure, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySeries {
    pub name: String,
    pub unit: Option<String>,
    pub points: Vec<StepValue>,
}

impl PropertySeries {
    pub fn label(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{} in {}", self.name, unit),
            None => self.name.clone(),
        }
    }

    pub fn value_at(&self, step: Step) -> Option<f64> {
        self.points.iter().find(|p| p.step == step).map(|p| p.value)
    }
}

/// Temperature at which each tool-reported solidification region holds,
/// one row per step.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTemperatureTable {
    pub temperature_unit: TemperatureUnit,
    pub regions: Vec<String>,
    pub rows: Vec<RegionTemperatureRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionTemperatureRow {
    pub step: Step,
    /// Same order as [`RegionTemperatureTable::regions`]; `None` where the
    /// region does not apply.
    pub temperatures: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositionRow {
    pub phase: String,
    pub step: Step,
    /// Same order as [`CompositionTable::elements`].
    pub amounts: Vec<Option<f64>>,
}

/// Element amounts inside each requested phase, phase by phase.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionTable {
    pub basis: FractionBasis,
    pub elements: Vec<String>,
    pub rows: Vec<CompositionRow>,
}

/// Input composition of every sample of a parameter study.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTable {
    pub names: Vec<String>,
    /// One row per sample, same order as `names`.
    pub samples: Vec<Vec<f64>>,
}

/// One calculation of a parameter study.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyBlock {
    pub sample: usize,
    /// Input amount per component, same order as [`StudyTable::components`].
    pub composition: Vec<f64>,
    pub table: PhaseTable,
}

/// Phase fractions of every sample of a parameter study.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyTable {
    pub model: String,
    pub temperature_unit: TemperatureUnit,
    pub components: Vec<String>,
    pub phases: Vec<String>,
    pub blocks: Vec<StudyBlock>,
}

impl StudyTable {
    pub fn temperature_label(&self) -> String {
        format!("Temperature in {}", self.temperature_unit)
    }
}

/// The sample of a study closest to a requested composition.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySlice {
    pub sample: usize,
    /// Requested composition, balance included, in component order.
    pub target: Vec<(String, f64)>,
    /// Component that took the remainder to 100.
    pub balance: Option<String>,
    /// Input composition of the matched sample, in component order.
    pub matched: Vec<f64>,
    pub table: PhaseTable,
}

impl StudySlice {
    /// Requested amounts without the balance: `Mg=5.00,Si=1.00`.
    pub fn label(&self) -> String {
        self.target
            .iter()
            .filter(|(name, _)| Some(name) != self.balance.as_ref())
            .map(|(name, value)| format!("{name}={value:.2}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}
