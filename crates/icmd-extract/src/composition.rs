//! Element amounts inside phases, and the input components of a study.

use icmd_document::dataset::COMPOSITION_PARAMETER;
use icmd_document::{PATH_SEPARATOR, join_path};
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::model_view::ModelView;
use crate::types::{ComponentTable, CompositionRow, CompositionTable};

#[derive(Debug, Clone, Copy)]
pub struct Composition<'a> {
    view: ModelView<'a>,
}

impl<'a> Composition<'a> {
    pub fn new(view: ModelView<'a>) -> Self {
        Self { view }
    }

    /// Phases that report a composition, in source order.
    pub fn phases(&self) -> ExtractResult<Vec<&'a str>> {
        let mut phases = Vec::new();
        for (path, _) in self.view.group(COMPOSITION_PARAMETER)? {
            if let Some((phase, _)) = path.split_once(PATH_SEPARATOR) {
                if !phases.contains(&phase) {
                    phases.push(phase);
                }
            }
        }
        Ok(phases)
    }

    /// Element amounts per step for `phases` (all of them when `None`),
    /// one block of rows per phase. Amounts are in the basis the model was
    /// loaded with.
    pub fn composition(&self, phases: Option<&[&str]>) -> ExtractResult<CompositionTable> {
        let phases = match phases {
            Some(phases) => phases.to_vec(),
            None => self.phases()?,
        };
        let elements = self.elements()?;

        let mut rows = Vec::new();
        for phase in &phases {
            let members = self.view.group(&join_path(COMPOSITION_PARAMETER, phase))?;
            let columns: Vec<_> = elements
                .iter()
                .map(|element| {
                    members
                        .iter()
                        .find(|(name, _)| *name == element.as_str())
                        .map(|(_, p)| *p)
                })
                .collect();
            rows.extend(self.view.steps().iter().map(|&step| CompositionRow {
                phase: (*phase).to_string(),
                step,
                amounts: columns
                    .iter()
                    .map(|p| p.and_then(|p| p.value_at(step)))
                    .collect(),
            }));
        }

        debug!(
            model = self.view.name(),
            phases = phases.len(),
            rows = rows.len(),
            "extracted phase composition"
        );
        Ok(CompositionTable {
            basis: self.view.units().basis,
            elements,
            rows,
        })
    }

    /// Input amount of every component per sample, leaving out `exclude`
    /// (usually the balance element).
    pub fn components(&self, exclude: Option<&str>) -> ExtractResult<ComponentTable> {
        let inputs: Vec<_> = self
            .view
            .inputs()
            .iter()
            .filter(|c| Some(c.name.as_str()) != exclude)
            .collect();
        if inputs.is_empty() {
            return Err(ExtractError::ParameterNotFound {
                model: self.view.name().to_string(),
                name: "components".to_string(),
            });
        }

        let count = inputs[0].samples.len();
        Ok(ComponentTable {
            names: inputs.iter().map(|c| c.name.clone()).collect(),
            samples: (0..count)
                .map(|s| inputs.iter().map(|c| c.samples[s]).collect())
                .collect(),
        })
    }

    /// The component coordinate, or the element names found under the
    /// composition group when the model has none.
    fn elements(&self) -> ExtractResult<Vec<String>> {
        let declared = self.view.components();
        if !declared.is_empty() {
            return Ok(declared.to_vec());
        }
        let mut elements: Vec<String> = Vec::new();
        for (path, _) in self.view.group(COMPOSITION_PARAMETER)? {
            if let Some((_, element)) = path.split_once(PATH_SEPARATOR) {
                if !elements.iter().any(|e| e == element) {
                    elements.push(element.to_string());
                }
            }
        }
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use icmd_core::FractionBasis;
    use icmd_document::LoadOptions;

    const DATASET: &str = r#"{
        "scheil": {
            "coords": {
                "phase": { "data": ["LIQUID", "FCC_A1"] },
                "component": { "data": ["Al", "Mg"] }
            },
            "data_vars": {
                "temperature": { "data": [[[660.0, 933.15, 1220.0]], [[620.0, 893.15, 1148.0]]] },
                "phase_fraction": { "data": [[
                    [[1.0, 1.0], [0.0, 0.0]],
                    [[0.6, 0.62], [0.4, 0.38]]
                ]] },
                "composition": { "data": [[
                    [[[0.95, 0.94], [0.05, 0.06]], ["None", "None"]],
                    [[[0.92, 0.91], [0.08, 0.09]], [[0.99, 0.99], [0.01, 0.01]]]
                ]] }
            },
            "attrs": { "input_dict": { "composition": { "components": [
                { "name": "Al", "samples": [95.0, 90.0] },
                { "name": "Mg", "samples": [5.0, 10.0] }
            ] } } }
        }
    }"#;

    const PLAIN: &str = r#"{
        "models": {
            "m": {
                "parameters": {
                    "temperature": [700, 650],
                    "composition": { "FCC_A1": { "Al": [0.98, 0.97], "Zn": [0.02, 0.03] } }
                }
            }
        }
    }"#;

    #[test]
    fn composition_rows_are_grouped_by_phase() {
        let catalog = Catalog::from_json_str("dataset", DATASET).unwrap();
        let table = catalog.composition("scheil").unwrap().composition(None).unwrap();
        assert_eq!(table.basis, FractionBasis::Mole);
        assert_eq!(table.elements, vec!["Al", "Mg"]);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[1].phase, "LIQUID");
        assert_eq!(table.rows[1].amounts, vec![Some(0.92), Some(0.08)]);
        assert_eq!(table.rows[2].phase, "FCC_A1");
        assert_eq!(table.rows[2].amounts, vec![None, None]);
    }

    #[test]
    fn mass_basis_is_carried_into_the_table() {
        let options = LoadOptions {
            basis: FractionBasis::Mass,
            ..LoadOptions::default()
        };
        let catalog = Catalog::from_json_str_with("dataset", DATASET, &options).unwrap();
        let table = catalog
            .composition("scheil")
            .unwrap()
            .composition(Some(&["FCC_A1"]))
            .unwrap();
        assert_eq!(table.basis, FractionBasis::Mass);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].amounts, vec![Some(0.99), Some(0.01)]);
    }

    #[test]
    fn unknown_phase_is_parameter_not_found() {
        let catalog = Catalog::from_json_str("dataset", DATASET).unwrap();
        let err = catalog
            .composition("scheil")
            .unwrap()
            .composition(Some(&["BCC_A2"]))
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::ParameterNotFound { ref name, .. } if name == "composition.BCC_A2"
        ));
    }

    #[test]
    fn plain_layout_composition_discovers_elements() {
        let catalog = Catalog::from_json_str("inline", PLAIN).unwrap();
        let composition = catalog.composition("m").unwrap();
        assert_eq!(composition.phases().unwrap(), vec!["FCC_A1"]);
        let table = composition.composition(None).unwrap();
        assert_eq!(table.elements, vec!["Al", "Zn"]);
        assert_eq!(table.rows[1].amounts, vec![Some(0.97), Some(0.03)]);
    }

    #[test]
    fn components_can_leave_out_the_balance() {
        let catalog = Catalog::from_json_str("dataset", DATASET).unwrap();
        let composition = catalog.composition("scheil").unwrap();

        let all = composition.components(None).unwrap();
        assert_eq!(all.names, vec!["Al", "Mg"]);
        assert_eq!(all.samples, vec![vec![95.0, 5.0], vec![90.0, 10.0]]);

        let alloying = composition.components(Some("Al")).unwrap();
        assert_eq!(alloying.names, vec!["Mg"]);
        assert_eq!(alloying.samples, vec![vec![5.0], vec![10.0]]);
    }

    #[test]
    fn models_without_inputs_have_no_components() {
        let catalog = Catalog::from_json_str("inline", PLAIN).unwrap();
        let err = catalog.composition("m").unwrap().components(None).unwrap_err();
        assert!(matches!(err, ExtractError::ParameterNotFound { .. }));
    }
}
