//! Typed, validated representation of an ICMD result document.

use std::collections::BTreeSet;

use icmd_core::{FractionBasis, PressureUnit, TemperatureUnit};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::dataset::{is_dataset_model, parse_dataset_model};
use crate::flatten::flatten;
use crate::load::RawDocument;
use crate::validate::{
    ValidationError, expect_object, expect_str, is_stepped_leaf, parse_leaf, parse_steps,
};
use crate::DocumentResult;

/// Index along the simulation progression.
pub type Step = u64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepValue {
    pub step: Step,
    pub value: f64,
}

/// One flattened parameter with its values in step order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Parameter {
    pub name: String,
    pub values: Vec<StepValue>,
}

impl Parameter {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = Step> + '_ {
        self.values.iter().map(|sv| sv.step)
    }

    /// Value at `step`, if the parameter reports one there.
    pub fn value_at(&self, step: Step) -> Option<f64> {
        self.values
            .binary_search_by_key(&step, |sv| sv.step)
            .ok()
            .map(|i| self.values[i].value)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.values.iter().map(|sv| sv.value).reduce(f64::max)
    }
}

/// Model type as reported by the simulation tool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelKind {
    Scheil,
    Equilibrium,
    Other(String),
    #[default]
    Unspecified,
}

impl ModelKind {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "scheil" | "solidification" => Self::Scheil,
            "equilibrium" | "temperature_step" | "temperaturestep" => Self::Equilibrium,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Scheil => "scheil",
            Self::Equilibrium => "equilibrium",
            Self::Other(s) => s,
            Self::Unspecified => "-",
        }
    }
}

/// Units the raw values of a model are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelUnits {
    pub temperature: TemperatureUnit,
    pub pressure: PressureUnit,
    pub basis: FractionBasis,
}

/// Column choices for documents that store several units side by side
/// (temperature triples, `[mole, mass]` fraction pairs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    pub basis: FractionBasis,
    pub temperature_column: TemperatureUnit,
}

/// Input amounts of one alloy component, one per sample of a parameter
/// study.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputComponent {
    pub name: String,
    pub samples: Vec<f64>,
}

/// One calculation of a parameter study. Parameters are named like the
/// model-level ones (`temperature`, phase names).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    pub temperature: Parameter,
    /// One parameter per phase, in phase order.
    pub phase_fractions: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelDef {
    pub name: String,
    pub kind: ModelKind,
    /// Declared steps, or the union of parameter steps when none are declared.
    pub steps: Vec<Step>,
    pub units: ModelUnits,
    /// Flattened parameters in source order. For dataset models these are
    /// the values of the first sample.
    pub parameters: Vec<Parameter>,
    /// Phase coordinate of dataset models.
    pub phases: Vec<String>,
    /// Component (element) coordinate of dataset models.
    pub components: Vec<String>,
    /// Solidification regions named by the tool.
    pub regions: Vec<String>,
    pub inputs: Vec<InputComponent>,
    pub samples: Vec<Sample>,
}

impl ModelDef {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Validated document: models in source order plus the global element set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub elements: BTreeSet<String>,
    pub models: Vec<ModelDef>,
}

impl Document {
    /// Validate a raw JSON document with default column choices.
    pub fn from_raw(raw: &RawDocument) -> DocumentResult<Self> {
        Self::from_raw_with(raw, &LoadOptions::default())
    }

    /// Validate a raw JSON document.
    ///
    /// Models live under `models`. Without that key, every top-level
    /// object holding `data_vars` is a model, which is how the tool writes
    /// one dataset per model.
    pub fn from_raw_with(raw: &RawDocument, options: &LoadOptions) -> DocumentResult<Self> {
        let root = expect_object(raw.root(), "$")?;

        let mut models = Vec::new();
        match root.get("models") {
            Some(value) => {
                for (name, model) in expect_object(value, "$.models")? {
                    models.push(parse_model(name, &format!("$.models.{name}"), model, options)?);
                }
            }
            None => {
                for (name, model) in root {
                    if model.as_object().is_some_and(is_dataset_model) {
                        models.push(parse_model(name, &format!("$.{name}"), model, options)?);
                    }
                }
                if models.is_empty() {
                    return Err(ValidationError::MissingField {
                        path: "$".to_string(),
                        field: "models",
                    }
                    .into());
                }
            }
        }

        let elements = match root.get("elements") {
            Some(value) => parse_elements(value)?,
            None => models
                .iter()
                .flat_map(|m| m.components.iter().cloned())
                .collect(),
        };

        debug!(
            origin = raw.origin(),
            models = models.len(),
            elements = elements.len(),
            "validated document"
        );
        Ok(Self { elements, models })
    }

    pub fn from_json_str(origin: &str, text: &str) -> DocumentResult<Self> {
        Self::from_raw(&RawDocument::parse(origin, text)?)
    }

    pub fn from_json_str_with(
        origin: &str,
        text: &str,
        options: &LoadOptions,
    ) -> DocumentResult<Self> {
        Self::from_raw_with(&RawDocument::parse(origin, text)?, options)
    }

    pub fn model(&self, name: &str) -> Option<&ModelDef> {
        self.models.iter().find(|m| m.name == name)
    }
}

fn parse_elements(value: &Value) -> Result<BTreeSet<String>, ValidationError> {
    let items = value.as_array().ok_or_else(|| ValidationError::InvalidType {
        path: "$.elements".to_string(),
        expected: "array of strings",
        found: crate::validate::type_name(value),
    })?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| expect_str(item, &format!("$.elements[{i}]")).map(str::to_string))
        .collect()
}

fn parse_model(
    name: &str,
    path: &str,
    value: &Value,
    options: &LoadOptions,
) -> Result<ModelDef, ValidationError> {
    let path = path.to_string();
    if name.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            path,
            reason: "model names must not be empty".to_string(),
        });
    }
    let obj = expect_object(value, &path)?;

    let kind = match obj.get("kind") {
        Some(v) => ModelKind::parse(expect_str(v, &format!("{path}.kind"))?),
        None => ModelKind::Unspecified,
    };

    let units = match obj.get("units") {
        Some(v) => parse_units(v, &format!("{path}.units"))?,
        None => ModelUnits::default(),
    };

    if is_dataset_model(obj) {
        return parse_dataset_model(name, &path, obj, kind, units, options);
    }

    let declared_steps = match obj.get("steps") {
        Some(v) => Some(parse_steps(v, &format!("{path}.steps"))?),
        None => None,
    };

    let params_path = format!("{path}.parameters");
    let params_value = obj.get("parameters").ok_or(ValidationError::MissingField {
        path: path.clone(),
        field: "parameters",
    })?;
    let params_obj = expect_object(params_value, &params_path)?;
    let parameters = parse_parameters(name, &params_path, params_obj, declared_steps.as_deref())?;

    let steps = match declared_steps {
        Some(steps) => steps,
        None => {
            let all: BTreeSet<Step> = parameters.iter().flat_map(|p| p.steps()).collect();
            all.into_iter().collect()
        }
    };

    Ok(ModelDef {
        name: name.to_string(),
        kind,
        steps,
        units,
        parameters,
        phases: Vec::new(),
        components: Vec::new(),
        regions: Vec::new(),
        inputs: Vec::new(),
        samples: Vec::new(),
    })
}

fn parse_units(value: &Value, path: &str) -> Result<ModelUnits, ValidationError> {
    let obj = expect_object(value, path)?;
    let mut units = ModelUnits::default();

    if let Some(v) = obj.get("temperature") {
        let unit_path = format!("{path}.temperature");
        units.temperature = expect_str(v, &unit_path)?
            .parse()
            .map_err(|source| ValidationError::Unit {
                path: unit_path,
                source,
            })?;
    }
    if let Some(v) = obj.get("pressure") {
        let unit_path = format!("{path}.pressure");
        units.pressure = expect_str(v, &unit_path)?
            .parse()
            .map_err(|source| ValidationError::Unit {
                path: unit_path,
                source,
            })?;
    }
    if let Some(v) = obj.get("basis") {
        let unit_path = format!("{path}.basis");
        units.basis = expect_str(v, &unit_path)?
            .parse()
            .map_err(|source| ValidationError::Unit {
                path: unit_path,
                source,
            })?;
    }
    Ok(units)
}

fn parse_parameters(
    model: &str,
    path: &str,
    params: &Map<String, Value>,
    model_steps: Option<&[Step]>,
) -> Result<Vec<Parameter>, ValidationError> {
    flatten(model, path, params, is_stepped_leaf)?
        .into_iter()
        .map(|leaf| parse_leaf(&leaf.name, &leaf.json_path, leaf.value, model_steps))
        .collect()
}
