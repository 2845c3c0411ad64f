//! Dataset-layout models, as the ICMD tool writes them.
//!
//! ```json
//! {
//!   "coords": {
//!     "phase": { "data": ["LIQUID", "FCC_A1"] },
//!     "component": { "data": ["Al", "Mg"] }
//!   },
//!   "data_vars": {
//!     "temperature": { "data": [[[660.0, 933.15, 1220.0]], ...] },
//!     "phase_fraction": { "data": [[[[1.0, 1.0], [0.0, 0.0]], ...]] }
//!   },
//!   "attrs": { "input_dict": { "composition": { "components": [..] } } }
//! }
//! ```
//!
//! Shapes, outermost first:
//! - `phase_fraction`: sample, step, phase, `[mole, mass]`
//! - `temperature` / `temperature_values`: step, 1, `[C, K, F]` for a
//!   single calculation, or sample, step, `[C, K, F]`
//! - `volume_fraction`: sample, step, phase
//! - `composition` / `phase_composition`: sample, step, phase, element,
//!   `[mole, mass]`
//! - `temperature_by_phase_region`: sample, step, region, `[C, F, K]`
//! - any other variable holding one number per step (optionally wrapped in
//!   a single sample) becomes a parameter under its own name
//!
//! Everything is normalized into the same flattened parameters the plain
//! layout produces (`temperature`, `phase_fraction.LIQUID`,
//! `composition.FCC_A1.Mg`, ...), taken from the first sample. All samples
//! are kept in [`ModelDef::samples`] for parameter studies.

use std::collections::{BTreeSet, HashSet};

use icmd_core::{FractionBasis, TemperatureUnit};
use serde_json::{Map, Value};
use tracing::debug;

use crate::flatten::join_path;
use crate::schema::{
    InputComponent, LoadOptions, ModelDef, ModelKind, ModelUnits, Parameter, Sample, Step,
    StepValue,
};
use crate::validate::{
    ValidationError, expect_array, expect_object, expect_str, parse_item, type_name,
};

pub const TEMPERATURE_VARS: [&str; 2] = ["temperature_values", "temperature"];
pub const PHASE_FRACTION_VAR: &str = "phase_fraction";
pub const VOLUME_FRACTION_VAR: &str = "volume_fraction";
pub const COMPOSITION_VARS: [&str; 2] = ["composition", "phase_composition"];
pub const REGION_TEMPERATURE_VAR: &str = "temperature_by_phase_region";

/// Column order of temperature triples.
pub const TEMPERATURE_COLUMNS: [&str; 3] = ["C", "K", "F"];
/// Column order of `temperature_by_phase_region` entries.
pub const REGION_TEMPERATURE_COLUMNS: [&str; 3] = ["C", "F", "K"];

/// Parameter name of the temperature series.
pub const TEMPERATURE_PARAMETER: &str = "temperature";
/// Group the `[phase][element]` amounts are flattened under.
pub const COMPOSITION_PARAMETER: &str = "composition";

pub fn is_dataset_model(obj: &Map<String, Value>) -> bool {
    obj.contains_key("data_vars")
}

fn column(order: &[&str; 3], unit: TemperatureUnit) -> usize {
    order
        .iter()
        .position(|c| *c == unit.symbol())
        .unwrap_or_default()
}

/// Cells indexed `[sample][step][column]`.
type Blocks = Vec<Vec<Vec<Option<f64>>>>;

pub fn parse_dataset_model(
    name: &str,
    path: &str,
    obj: &Map<String, Value>,
    kind: ModelKind,
    declared: ModelUnits,
    options: &LoadOptions,
) -> Result<ModelDef, ValidationError> {
    let coords = match obj.get("coords") {
        Some(v) => Some(expect_object(v, &format!("{path}.coords"))?),
        None => None,
    };
    let phases = coord_names(coords, "phase", path)?;
    let components = coord_names(coords, "component", path)?;
    let regions = coord_names(coords, "solidification_region", path)?;

    let vars_path = format!("{path}.data_vars");
    let vars = obj
        .get("data_vars")
        .ok_or(ValidationError::MissingField {
            path: path.to_string(),
            field: "data_vars",
        })
        .and_then(|v| expect_object(v, &vars_path))?;
    let mut builder = ParameterSet::new(name);

    let fractions = match var_data(vars, &[PHASE_FRACTION_VAR], &vars_path)? {
        Some((var_path, data)) => {
            require_coord(&phases, "phase", path)?;
            let blocks = grid_blocks(data, &var_path, &phases, options.basis.index())?;
            for (i, phase) in phases.iter().enumerate() {
                builder.push(
                    join_path(PHASE_FRACTION_VAR, phase),
                    blocks.first().map(|b| column_of(b, i)).unwrap_or_default(),
                )?;
            }
            blocks
        }
        None => Vec::new(),
    };

    let temperature_column = column(&TEMPERATURE_COLUMNS, options.temperature_column);
    let temperatures = match var_data(vars, &TEMPERATURE_VARS, &vars_path)? {
        Some((var_path, data)) => {
            let blocks = temperature_blocks(data, &var_path, fractions.len(), temperature_column)?;
            builder.push(
                TEMPERATURE_PARAMETER.to_string(),
                blocks.first().cloned().unwrap_or_default(),
            )?;
            blocks
        }
        None => Vec::new(),
    };

    if let Some((var_path, data)) = var_data(vars, &[VOLUME_FRACTION_VAR], &vars_path)? {
        require_coord(&phases, "phase", path)?;
        let blocks = grid_blocks(data, &var_path, &phases, options.basis.index())?;
        for (i, phase) in phases.iter().enumerate() {
            builder.push(
                join_path(VOLUME_FRACTION_VAR, phase),
                blocks.first().map(|b| column_of(b, i)).unwrap_or_default(),
            )?;
        }
    }

    if let Some((var_path, data)) = var_data(vars, &COMPOSITION_VARS, &vars_path)? {
        require_coord(&phases, "phase", path)?;
        require_coord(&components, "component", path)?;
        read_composition(
            data,
            &var_path,
            &phases,
            &components,
            options.basis,
            &mut builder,
        )?;
    }

    if let Some((var_path, data)) = var_data(vars, &[REGION_TEMPERATURE_VAR], &vars_path)? {
        require_coord(&regions, "solidification_region", path)?;
        let pick = column(&REGION_TEMPERATURE_COLUMNS, options.temperature_column);
        let blocks = grid_blocks(data, &var_path, &regions, pick)?;
        for (i, region) in regions.iter().enumerate() {
            builder.push(
                join_path(REGION_TEMPERATURE_VAR, region),
                blocks.first().map(|b| column_of(b, i)).unwrap_or_default(),
            )?;
        }
    }

    for (var, value) in vars {
        if is_structured_var(var) {
            continue;
        }
        let var_path = format!("{vars_path}.{var}");
        match step_series(value) {
            Some(items) => {
                let cells = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| parse_item(item, &format!("{var_path}.data[{i}]")))
                    .collect::<Result<Vec<_>, _>>()?;
                builder.push(var.clone(), cells)?;
            }
            None => debug!(model = name, var = var.as_str(), "skipped data variable"),
        }
    }

    let inputs = parse_inputs(obj.get("attrs"), path)?;
    let samples = build_samples(&phases, &fractions, &temperatures);
    let parameters = builder.finish();

    let steps = match temperatures.first() {
        Some(first) => (0..first.len() as Step).collect(),
        None => {
            let all: BTreeSet<Step> = parameters.iter().flat_map(|p| p.steps()).collect();
            all.into_iter().collect()
        }
    };

    let kind = match kind {
        ModelKind::Unspecified if !regions.is_empty() => ModelKind::Scheil,
        other => other,
    };

    debug!(
        model = name,
        phases = phases.len(),
        samples = samples.len(),
        parameters = parameters.len(),
        "read dataset model"
    );

    Ok(ModelDef {
        name: name.to_string(),
        kind,
        steps,
        units: ModelUnits {
            temperature: options.temperature_column,
            pressure: declared.pressure,
            basis: options.basis,
        },
        parameters,
        phases,
        components,
        regions,
        inputs,
        samples,
    })
}

/// Collects parameters in insertion order and rejects repeated names.
struct ParameterSet<'a> {
    model: &'a str,
    seen: HashSet<String>,
    parameters: Vec<Parameter>,
}

impl<'a> ParameterSet<'a> {
    fn new(model: &'a str) -> Self {
        Self {
            model,
            seen: HashSet::new(),
            parameters: Vec::new(),
        }
    }

    fn push(&mut self, name: String, cells: Vec<Option<f64>>) -> Result<(), ValidationError> {
        if !self.seen.insert(name.clone()) {
            return Err(ValidationError::DuplicateParameter {
                model: self.model.to_string(),
                name,
            });
        }
        self.parameters.push(series(name, &cells));
        Ok(())
    }

    fn finish(self) -> Vec<Parameter> {
        self.parameters
    }
}

/// Parameter over index steps; empty cells leave their step out.
fn series(name: String, cells: &[Option<f64>]) -> Parameter {
    Parameter {
        name,
        values: cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                cell.map(|value| StepValue {
                    step: i as Step,
                    value,
                })
            })
            .collect(),
    }
}

fn column_of(block: &[Vec<Option<f64>>], i: usize) -> Vec<Option<f64>> {
    block.iter().map(|row| row[i]).collect()
}

fn is_structured_var(var: &str) -> bool {
    var == PHASE_FRACTION_VAR
        || var == VOLUME_FRACTION_VAR
        || var == REGION_TEMPERATURE_VAR
        || TEMPERATURE_VARS.contains(&var)
        || COMPOSITION_VARS.contains(&var)
}

fn coord_names(
    coords: Option<&Map<String, Value>>,
    coord: &str,
    path: &str,
) -> Result<Vec<String>, ValidationError> {
    let Some(value) = coords.and_then(|c| c.get(coord)) else {
        return Ok(Vec::new());
    };
    let coord_path = format!("{path}.coords.{coord}");
    let data = expect_object(value, &coord_path)?
        .get("data")
        .ok_or(ValidationError::MissingField {
            path: coord_path.clone(),
            field: "data",
        })?;
    let data_path = format!("{coord_path}.data");
    expect_array(data, &data_path)?
        .iter()
        .enumerate()
        .map(|(i, item)| expect_str(item, &format!("{data_path}[{i}]")).map(str::to_string))
        .collect()
}

fn require_coord(names: &[String], coord: &'static str, path: &str) -> Result<(), ValidationError> {
    if names.is_empty() {
        return Err(ValidationError::MissingField {
            path: format!("{path}.coords"),
            field: coord,
        });
    }
    Ok(())
}

/// The `data` array of the first variable in `names` that exists, with its
/// JSON path.
fn var_data<'v>(
    vars: &'v Map<String, Value>,
    names: &[&str],
    vars_path: &str,
) -> Result<Option<(String, &'v Value)>, ValidationError> {
    let Some((name, value)) = names
        .iter()
        .find_map(|name| vars.get(*name).map(|value| (*name, value)))
    else {
        return Ok(None);
    };
    let var_path = format!("{vars_path}.{name}");
    let data = expect_object(value, &var_path)?
        .get("data")
        .ok_or(ValidationError::MissingField {
            path: var_path.clone(),
            field: "data",
        })?;
    Ok(Some((format!("{var_path}.data"), data)))
}

/// One value out of a cell. Array cells hold one entry per unit or basis
/// and `pick` selects it; scalar cells are taken as they are.
fn cell(value: &Value, pick: usize, path: &str) -> Result<Option<f64>, ValidationError> {
    match value {
        Value::Array(items) => {
            let item = items.get(pick).ok_or_else(|| ValidationError::InvalidValue {
                path: path.to_string(),
                reason: format!("expected at least {} entries, found {}", pick + 1, items.len()),
            })?;
            parse_item(item, &format!("{path}[{pick}]"))
        }
        other => parse_item(other, path),
    }
}

/// `[sample][step][label]` cells, where each step row holds one cell per
/// label (phase or region).
fn grid_blocks(
    data: &Value,
    path: &str,
    labels: &[String],
    pick: usize,
) -> Result<Blocks, ValidationError> {
    let mut blocks = Vec::new();
    for (s, block) in expect_array(data, path)?.iter().enumerate() {
        let block_path = format!("{path}[{s}]");
        let mut rows = Vec::new();
        for (t, row) in expect_array(block, &block_path)?.iter().enumerate() {
            let row_path = format!("{block_path}[{t}]");
            let cells = expect_array(row, &row_path)?;
            if cells.len() != labels.len() {
                return Err(ValidationError::InvalidValue {
                    path: row_path,
                    reason: format!("expected {} entries, found {}", labels.len(), cells.len()),
                });
            }
            rows.push(
                cells
                    .iter()
                    .enumerate()
                    .map(|(i, c)| cell(c, pick, &format!("{row_path}[{i}]")))
                    .collect::<Result<Vec<_>, _>>()?,
            );
        }
        blocks.push(rows);
    }
    Ok(blocks)
}

/// Temperature cells as `[sample][step]`.
///
/// A single calculation stores one `[C, K, F]` triple per step, either
/// bare or wrapped in a one-element list. Parameter studies store one list
/// of triples per sample.
fn temperature_blocks(
    data: &Value,
    path: &str,
    sample_count: usize,
    pick: usize,
) -> Result<Vec<Vec<Option<f64>>>, ValidationError> {
    let outer = expect_array(data, path)?;
    let sample_major = sample_count > 1
        || (outer.len() == 1
            && outer[0]
                .as_array()
                .is_some_and(|steps| steps.len() > 1 && steps.iter().all(Value::is_array)));

    if sample_major {
        return outer
            .iter()
            .enumerate()
            .map(|(s, block)| -> Result<Vec<Option<f64>>, ValidationError> {
                let block_path = format!("{path}[{s}]");
                expect_array(block, &block_path)?
                    .iter()
                    .enumerate()
                    .map(|(t, triple)| cell(triple, pick, &format!("{block_path}[{t}]")))
                    .collect()
            })
            .collect();
    }

    let steps = outer
        .iter()
        .enumerate()
        .map(|(t, entry)| {
            let entry_path = format!("{path}[{t}]");
            match entry {
                Value::Array(items) if items.first().is_some_and(Value::is_array) => {
                    cell(&items[0], pick, &format!("{entry_path}[0]"))
                }
                other => cell(other, pick, &entry_path),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(vec![steps])
}

fn read_composition(
    data: &Value,
    path: &str,
    phases: &[String],
    components: &[String],
    basis: FractionBasis,
    builder: &mut ParameterSet<'_>,
) -> Result<(), ValidationError> {
    let first = match expect_array(data, path)?.first() {
        Some(block) => expect_array(block, &format!("{path}[0]"))?,
        None => &[],
    };

    // [phase][component] -> cells over steps
    let mut columns = vec![vec![Vec::with_capacity(first.len()); components.len()]; phases.len()];
    for (t, step) in first.iter().enumerate() {
        let step_path = format!("{path}[0][{t}]");
        let rows = expect_array(step, &step_path)?;
        if rows.len() != phases.len() {
            return Err(ValidationError::InvalidValue {
                path: step_path,
                reason: format!("expected {} phases, found {}", phases.len(), rows.len()),
            });
        }
        for (p, row) in rows.iter().enumerate() {
            let row_path = format!("{step_path}[{p}]");
            let cells = expect_array(row, &row_path)?;
            if cells.len() != components.len() {
                return Err(ValidationError::InvalidValue {
                    path: row_path,
                    reason: format!(
                        "expected {} components, found {}",
                        components.len(),
                        cells.len()
                    ),
                });
            }
            for (c, value) in cells.iter().enumerate() {
                columns[p][c].push(cell(value, basis.index(), &format!("{row_path}[{c}]"))?);
            }
        }
    }

    for (phase, per_component) in phases.iter().zip(columns) {
        for (component, cells) in components.iter().zip(per_component) {
            let name = join_path(&join_path(COMPOSITION_PARAMETER, phase), component);
            builder.push(name, cells)?;
        }
    }
    Ok(())
}

/// Items of a per-step variable: a flat list of numbers, or such a list
/// wrapped in one sample.
fn step_series(value: &Value) -> Option<&[Value]> {
    let data = value.as_object()?.get("data")?.as_array()?;
    let is_flat = |items: &[Value]| items.iter().all(|v| !v.is_array() && !v.is_object());
    if is_flat(data) {
        return Some(data);
    }
    match data.as_slice() {
        [only] => only.as_array().map(Vec::as_slice).filter(|items| is_flat(items)),
        _ => None,
    }
}

/// `attrs.input_dict.composition.components`: `[{"name": .., "samples": [..]}]`.
fn parse_inputs(attrs: Option<&Value>, path: &str) -> Result<Vec<InputComponent>, ValidationError> {
    let Some(list) = attrs
        .and_then(|a| a.get("input_dict"))
        .and_then(|d| d.get("composition"))
        .and_then(|c| c.get("components"))
    else {
        return Ok(Vec::new());
    };
    let list_path = format!("{path}.attrs.input_dict.composition.components");
    let inputs = expect_array(list, &list_path)?
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let entry_path = format!("{list_path}[{i}]");
            let obj = expect_object(entry, &entry_path)?;
            let name = obj.get("name").ok_or(ValidationError::MissingField {
                path: entry_path.clone(),
                field: "name",
            })?;
            let samples = obj.get("samples").ok_or(ValidationError::MissingField {
                path: entry_path.clone(),
                field: "samples",
            })?;
            let samples_path = format!("{entry_path}.samples");
            let samples = expect_array(samples, &samples_path)?
                .iter()
                .enumerate()
                .map(|(j, v)| {
                    let item_path = format!("{samples_path}[{j}]");
                    parse_item(v, &item_path)?.ok_or_else(|| ValidationError::InvalidType {
                        path: item_path,
                        expected: "number",
                        found: type_name(v),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(InputComponent {
                name: expect_str(name, &format!("{entry_path}.name"))?.to_string(),
                samples,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    // Every component lists one amount per sample.
    if let Some(first) = inputs.first() {
        if let Some(odd) = inputs.iter().find(|c| c.samples.len() != first.samples.len()) {
            return Err(ValidationError::InvalidValue {
                path: list_path,
                reason: format!(
                    "'{}' has {} samples but '{}' has {}",
                    odd.name,
                    odd.samples.len(),
                    first.name,
                    first.samples.len()
                ),
            });
        }
    }
    Ok(inputs)
}

fn build_samples(
    phases: &[String],
    fractions: &Blocks,
    temperatures: &[Vec<Option<f64>>],
) -> Vec<Sample> {
    let count = fractions.len().max(temperatures.len());
    (0..count)
        .map(|s| Sample {
            temperature: series(
                TEMPERATURE_PARAMETER.to_string(),
                temperatures.get(s).map(Vec::as_slice).unwrap_or_default(),
            ),
            phase_fractions: match fractions.get(s) {
                Some(block) => phases
                    .iter()
                    .enumerate()
                    .map(|(i, phase)| series(phase.clone(), &column_of(block, i)))
                    .collect(),
                None => Vec::new(),
            },
        })
        .collect()
}
