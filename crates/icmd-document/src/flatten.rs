//! Flattening of nested parameter groups into dotted names.
//!
//! Rule: group keys are joined with [`PATH_SEPARATOR`], so
//! `{"system": {"density": [..]}}` yields `system.density`. Keys must be
//! non-empty. Two leaves that end up with the same flattened name (for
//! example a literal `"a.b"` key next to `{"a": {"b": ..}}`) are rejected
//! with [`ValidationError::DuplicateParameter`].

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::validate::ValidationError;

pub const PATH_SEPARATOR: char = '.';

pub fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{PATH_SEPARATOR}{key}")
    }
}

/// A leaf found while walking a parameter tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatLeaf<'a> {
    /// Flattened parameter name (`system.density`).
    pub name: String,
    /// JSON path used in error messages.
    pub json_path: String,
    pub value: &'a Value,
}

/// Walk `root` depth-first in source order and return every leaf.
///
/// Objects for which `is_leaf` returns true are not descended into; every
/// non-object value is a leaf and left to the caller to interpret.
pub fn flatten<'a, F>(
    model: &str,
    json_path: &str,
    root: &'a Map<String, Value>,
    is_leaf: F,
) -> Result<Vec<FlatLeaf<'a>>, ValidationError>
where
    F: Fn(&Map<String, Value>) -> bool,
{
    let mut leaves = Vec::new();
    let mut seen = HashSet::new();
    walk(
        model,
        "",
        json_path,
        root,
        &is_leaf,
        &mut seen,
        &mut leaves,
    )?;
    Ok(leaves)
}

fn walk<'a, F>(
    model: &str,
    prefix: &str,
    json_path: &str,
    group: &'a Map<String, Value>,
    is_leaf: &F,
    seen: &mut HashSet<String>,
    out: &mut Vec<FlatLeaf<'a>>,
) -> Result<(), ValidationError>
where
    F: Fn(&Map<String, Value>) -> bool,
{
    for (key, value) in group {
        let child_path = format!("{json_path}.{key}");
        if key.is_empty() {
            return Err(ValidationError::InvalidValue {
                path: child_path,
                reason: "parameter names must not be empty".to_string(),
            });
        }

        let name = join_path(prefix, key);
        match value {
            Value::Object(obj) if !is_leaf(obj) => {
                walk(model, &name, &child_path, obj, is_leaf, seen, out)?;
            }
            _ => {
                if !seen.insert(name.clone()) {
                    return Err(ValidationError::DuplicateParameter {
                        model: model.to_string(),
                        name,
                    });
                }
                out.push(FlatLeaf {
                    name,
                    json_path: child_path,
                    value,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn never_leaf(_: &Map<String, Value>) -> bool {
        false
    }

    fn names(leaves: &[FlatLeaf<'_>]) -> Vec<String> {
        leaves.iter().map(|l| l.name.clone()).collect()
    }

    #[test]
    fn nested_groups_join_with_dots() {
        let tree = json!({
            "temperature": [1, 2],
            "system": { "density": [3], "thermo": { "enthalpy": [4] } }
        });
        let leaves = flatten("m", "$", tree.as_object().unwrap(), never_leaf).unwrap();
        assert_eq!(
            names(&leaves),
            vec!["temperature", "system.density", "system.thermo.enthalpy"]
        );
        assert_eq!(leaves[2].json_path, "$.system.thermo.enthalpy");
    }

    #[test]
    fn same_leaf_name_in_different_groups_is_kept() {
        let tree = json!({
            "liquid": { "density": [1] },
            "solid": { "density": [2] }
        });
        let leaves = flatten("m", "$", tree.as_object().unwrap(), never_leaf).unwrap();
        assert_eq!(names(&leaves), vec!["liquid.density", "solid.density"]);
    }

    #[test]
    fn colliding_flattened_names_are_rejected() {
        let tree = json!({
            "a.b": [1],
            "a": { "b": [2] }
        });
        let err = flatten("model1", "$", tree.as_object().unwrap(), never_leaf).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::DuplicateParameter { ref model, ref name }
                if model == "model1" && name == "a.b"
        ));
    }

    #[test]
    fn empty_key_is_rejected() {
        let tree = json!({ "": [1] });
        let err = flatten("m", "$", tree.as_object().unwrap(), never_leaf).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn leaf_objects_are_not_descended() {
        let tree = json!({ "density": { "steps": [0], "values": [1.0] } });
        let leaves = flatten("m", "$", tree.as_object().unwrap(), |obj| {
            obj.contains_key("values")
        })
        .unwrap();
        assert_eq!(names(&leaves), vec!["density"]);
    }

    #[test]
    fn empty_group_yields_nothing() {
        let tree = json!({ "system": {} });
        let leaves = flatten("m", "$", tree.as_object().unwrap(), never_leaf).unwrap();
        assert!(leaves.is_empty());
    }
}
