//! Read-only view over one model's flattened parameters.

use std::collections::BTreeMap;

use icmd_document::{
    InputComponent, ModelDef, ModelKind, ModelUnits, PATH_SEPARATOR, Parameter, Sample, Step,
    StepValue,
};

use crate::error::{ExtractError, ExtractResult};

#[derive(Debug, Clone, Copy)]
pub struct ModelView<'a> {
    model: &'a ModelDef,
}

impl<'a> ModelView<'a> {
    pub fn new(model: &'a ModelDef) -> Self {
        Self { model }
    }

    pub fn name(&self) -> &'a str {
        &self.model.name
    }

    pub fn kind(&self) -> &'a ModelKind {
        &self.model.kind
    }

    pub fn steps(&self) -> &'a [Step] {
        &self.model.steps
    }

    pub fn units(&self) -> ModelUnits {
        self.model.units
    }

    /// Phase coordinate; empty for plain-layout models.
    pub fn phase_names(&self) -> &'a [String] {
        &self.model.phases
    }

    pub fn components(&self) -> &'a [String] {
        &self.model.components
    }

    pub fn regions(&self) -> &'a [String] {
        &self.model.regions
    }

    pub fn inputs(&self) -> &'a [InputComponent] {
        &self.model.inputs
    }

    pub fn samples(&self) -> &'a [Sample] {
        &self.model.samples
    }

    /// Flattened parameter names in source order.
    pub fn parameter_names(&self) -> Vec<&'a str> {
        self.model
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Every flattened parameter with its `(step, value)` pairs.
    pub fn parameter_values(&self) -> BTreeMap<&'a str, &'a [StepValue]> {
        self.model
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.values.as_slice()))
            .collect()
    }

    pub fn parameter(&self, name: &str) -> ExtractResult<&'a Parameter> {
        self.model
            .parameter(name)
            .ok_or_else(|| self.not_found(name))
    }

    /// First of `aliases` that exists in this model.
    pub fn first_parameter(&self, aliases: &[&str]) -> ExtractResult<&'a Parameter> {
        aliases
            .iter()
            .find_map(|name| self.model.parameter(name))
            .ok_or_else(|| self.not_found(&aliases.join(" | ")))
    }

    /// Parameters nested under `prefix`, keyed by their path below it.
    pub fn group(&self, prefix: &str) -> ExtractResult<Vec<(&'a str, &'a Parameter)>> {
        let members: Vec<_> = self
            .model
            .parameters
            .iter()
            .filter_map(|p| {
                p.name
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix(PATH_SEPARATOR))
                    .map(|child| (child, p))
            })
            .collect();

        if members.is_empty() {
            return Err(self.not_found(prefix));
        }
        Ok(members)
    }

    /// First of `aliases` that names a non-empty group.
    pub fn first_group(&self, aliases: &[&str]) -> ExtractResult<Vec<(&'a str, &'a Parameter)>> {
        aliases
            .iter()
            .find_map(|prefix| self.group(prefix).ok())
            .ok_or_else(|| self.not_found(&aliases.join(" | ")))
    }

    fn not_found(&self, name: &str) -> ExtractError {
        ExtractError::ParameterNotFound {
            model: self.model.name.clone(),
            name: name.to_string(),
        }
    }
}
