//! Schema checks for raw JSON values.
//!
//! These helpers turn loosely-typed JSON into the typed pieces of
//! [`crate::schema`], failing with the JSON path of the first offending
//! value.

use icmd_core::{UnitError, ensure_finite};
use serde_json::{Map, Value};

use crate::schema::{Parameter, Step, StepValue};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Missing field '{field}' at {path}")]
    MissingField { path: String, field: &'static str },

    #[error("Invalid type at {path}: expected {expected}, found {found}")]
    InvalidType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid value at {path}: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("Duplicate parameter '{name}' in model '{model}' after flattening")]
    DuplicateParameter { model: String, name: String },

    #[error("Invalid unit at {path}: {source}")]
    Unit { path: String, source: UnitError },
}

/// Strings the simulation tool writes for missing values.
const NULL_STRINGS: [&str; 4] = ["None", "NaN", "nan", "null"];

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn expect_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    value.as_object().ok_or_else(|| ValidationError::InvalidType {
        path: path.to_string(),
        expected: "object",
        found: type_name(value),
    })
}

pub fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], ValidationError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ValidationError::InvalidType {
            path: path.to_string(),
            expected: "array",
            found: type_name(value),
        })
}

pub fn expect_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, ValidationError> {
    value.as_str().ok_or_else(|| ValidationError::InvalidType {
        path: path.to_string(),
        expected: "string",
        found: type_name(value),
    })
}

/// Parse a step list: non-negative integers, strictly increasing.
pub fn parse_steps(value: &Value, path: &str) -> Result<Vec<Step>, ValidationError> {
    let items = value.as_array().ok_or_else(|| ValidationError::InvalidType {
        path: path.to_string(),
        expected: "array of step indices",
        found: type_name(value),
    })?;

    let mut steps = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{i}]");
        let step = item.as_u64().ok_or_else(|| ValidationError::InvalidType {
            path: item_path.clone(),
            expected: "non-negative integer",
            found: type_name(item),
        })?;
        if let Some(&prev) = steps.last()
            && step <= prev
        {
            return Err(ValidationError::InvalidValue {
                path: item_path,
                reason: format!("steps must be strictly increasing ({prev} then {step})"),
            });
        }
        steps.push(step);
    }
    Ok(steps)
}

/// Whether an object is a stepped leaf (`{"steps": [..], "values": [..]}`)
/// rather than a parameter group.
pub fn is_stepped_leaf(obj: &Map<String, Value>) -> bool {
    ["values", "data"]
        .iter()
        .any(|key| obj.get(*key).is_some_and(Value::is_array))
}

/// Interpret one flattened leaf.
///
/// `model_steps` is the model's declared step list, if any. Plain arrays
/// are matched to it item by item; without it, item `i` is step `i`.
pub fn parse_leaf(
    name: &str,
    path: &str,
    value: &Value,
    model_steps: Option<&[Step]>,
) -> Result<Parameter, ValidationError> {
    let values = match value {
        Value::Array(items) => {
            if let Some(steps) = model_steps
                && steps.len() != items.len()
            {
                return Err(ValidationError::InvalidValue {
                    path: path.to_string(),
                    reason: format!(
                        "expected {} values to match the model steps, found {}",
                        steps.len(),
                        items.len()
                    ),
                });
            }
            let steps: Vec<Step> = match model_steps {
                Some(steps) => steps.to_vec(),
                None => (0..items.len() as Step).collect(),
            };
            collect_values(path, items, &steps)?
        }
        Value::Object(obj) if is_stepped_leaf(obj) => parse_stepped_leaf(path, obj, model_steps)?,
        other => {
            return Err(ValidationError::InvalidType {
                path: path.to_string(),
                expected: "array of numbers or a stepped object",
                found: type_name(other),
            });
        }
    };

    Ok(Parameter {
        name: name.to_string(),
        values,
    })
}

fn parse_stepped_leaf(
    path: &str,
    obj: &Map<String, Value>,
    model_steps: Option<&[Step]>,
) -> Result<Vec<StepValue>, ValidationError> {
    let (key, items) = match (obj.get("values"), obj.get("data")) {
        (Some(_), Some(_)) => {
            return Err(ValidationError::InvalidValue {
                path: path.to_string(),
                reason: "stepped parameter holds both 'values' and 'data'".to_string(),
            });
        }
        (Some(v), None) => ("values", v),
        (None, Some(v)) => ("data", v),
        (None, None) => {
            return Err(ValidationError::MissingField {
                path: path.to_string(),
                field: "values",
            });
        }
    };
    let items_path = format!("{path}.{key}");
    let items = items.as_array().ok_or_else(|| ValidationError::InvalidType {
        path: items_path.clone(),
        expected: "array",
        found: type_name(items),
    })?;

    let steps = match obj.get("steps") {
        Some(raw) => parse_steps(raw, &format!("{path}.steps"))?,
        None => match model_steps {
            Some(steps) => steps.to_vec(),
            None => (0..items.len() as Step).collect(),
        },
    };
    if steps.len() != items.len() {
        return Err(ValidationError::InvalidValue {
            path: path.to_string(),
            reason: format!(
                "{} steps but {} values",
                steps.len(),
                items.len()
            ),
        });
    }

    collect_values(&items_path, items, &steps)
}

fn collect_values(
    path: &str,
    items: &[Value],
    steps: &[Step],
) -> Result<Vec<StepValue>, ValidationError> {
    let mut values = Vec::with_capacity(items.len());
    for (i, (item, &step)) in items.iter().zip(steps).enumerate() {
        if let Some(value) = parse_item(item, &format!("{path}[{i}]"))? {
            values.push(StepValue { step, value });
        }
    }
    Ok(values)
}

pub(crate) fn parse_item(item: &Value, path: &str) -> Result<Option<f64>, ValidationError> {
    match item {
        Value::Null => Ok(None),
        Value::String(s) if NULL_STRINGS.contains(&s.as_str()) => Ok(None),
        Value::Number(n) => {
            let v = n.as_f64().ok_or_else(|| ValidationError::InvalidValue {
                path: path.to_string(),
                reason: format!("number {n} is not representable as f64"),
            })?;
            let v = ensure_finite(v, "parameter value").map_err(|e| {
                ValidationError::InvalidValue {
                    path: path.to_string(),
                    reason: e.to_string(),
                }
            })?;
            Ok(Some(v))
        }
        other => Err(ValidationError::InvalidType {
            path: path.to_string(),
            expected: "number or null",
            found: type_name(other),
        }),
    }
}
