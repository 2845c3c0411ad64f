//! Model catalog: listing and lookup over a validated document.

use std::collections::BTreeSet;
use std::path::Path;

use icmd_document::{Document, LoadOptions, load_document_with};

use crate::composition::Composition;
use crate::equilibrium::Equilibrium;
use crate::error::{ExtractError, ExtractResult};
use crate::model_view::ModelView;
use crate::solidification::Solidification;
use crate::study::ParameterStudy;

/// Summary of a model for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub name: String,
    pub kind: String,
    pub step_count: usize,
    pub parameter_count: usize,
}

/// Entry point over one loaded document.
#[derive(Debug, Clone)]
pub struct Catalog {
    document: Document,
}

impl Catalog {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Load and validate a JSON file.
    pub fn open(path: &Path) -> ExtractResult<Self> {
        Self::open_with(path, &LoadOptions::default())
    }

    /// Load with explicit fraction basis and temperature column for
    /// dataset-layout models.
    pub fn open_with(path: &Path, options: &LoadOptions) -> ExtractResult<Self> {
        Ok(Self::new(load_document_with(path, options)?))
    }

    pub fn from_json_str(origin: &str, text: &str) -> ExtractResult<Self> {
        Self::from_json_str_with(origin, text, &LoadOptions::default())
    }

    pub fn from_json_str_with(
        origin: &str,
        text: &str,
        options: &LoadOptions,
    ) -> ExtractResult<Self> {
        Ok(Self::new(Document::from_json_str_with(origin, text, options)?))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Model names in document order.
    pub fn list_models(&self) -> Vec<&str> {
        self.document
            .models
            .iter()
            .map(|m| m.name.as_str())
            .collect()
    }

    pub fn list_elements(&self) -> BTreeSet<&str> {
        self.document.elements.iter().map(String::as_str).collect()
    }

    pub fn get_model(&self, name: &str) -> ExtractResult<ModelView<'_>> {
        self.document
            .model(name)
            .map(ModelView::new)
            .ok_or_else(|| ExtractError::ModelNotFound(name.to_string()))
    }

    pub fn summaries(&self) -> Vec<ModelSummary> {
        self.document
            .models
            .iter()
            .map(|m| ModelSummary {
                name: m.name.clone(),
                kind: m.kind.label().to_string(),
                step_count: m.steps.len(),
                parameter_count: m.parameters.len(),
            })
            .collect()
    }

    pub fn solidification(&self, name: &str) -> ExtractResult<Solidification<'_>> {
        Solidification::new(self.get_model(name)?)
    }

    pub fn equilibrium(&self, name: &str) -> ExtractResult<Equilibrium<'_>> {
        Ok(Equilibrium::new(self.get_model(name)?))
    }

    pub fn composition(&self, name: &str) -> ExtractResult<Composition<'_>> {
        Ok(Composition::new(self.get_model(name)?))
    }

    pub fn parameter_study(&self, name: &str) -> ExtractResult<ParameterStudy<'_>> {
        ParameterStudy::new(self.get_model(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "elements": ["Mg", "Al"],
        "models": {
            "second": { "kind": "equilibrium", "parameters": { "density": [2.7, 2.6] } },
            "first": { "kind": "scheil", "steps": [0, 1], "parameters": { "temperature": [600, 500] } }
        }
    }"#;

    #[test]
    fn list_models_keeps_source_order() {
        let catalog = Catalog::from_json_str("inline", DOC).unwrap();
        assert_eq!(catalog.list_models(), vec!["second", "first"]);
    }

    #[test]
    fn list_elements_is_a_set() {
        let catalog = Catalog::from_json_str("inline", DOC).unwrap();
        let elements: Vec<&str> = catalog.list_elements().into_iter().collect();
        assert_eq!(elements, vec!["Al", "Mg"]);
    }

    #[test]
    fn unknown_model_is_model_not_found() {
        let catalog = Catalog::from_json_str("inline", DOC).unwrap();
        let err = catalog.get_model("third").unwrap_err();
        assert!(matches!(err, ExtractError::ModelNotFound(ref name) if name == "third"));
    }

    #[test]
    fn summaries_report_counts() {
        let catalog = Catalog::from_json_str("inline", DOC).unwrap();
        let summaries = catalog.summaries();
        assert_eq!(summaries[0].kind, "equilibrium");
        assert_eq!(summaries[0].step_count, 2);
        assert_eq!(summaries[1].parameter_count, 1);
    }

    #[test]
    fn invalid_document_is_data_load_error() {
        let err = Catalog::from_json_str("inline", r#"{"models": []}"#).unwrap_err();
        assert!(matches!(err, ExtractError::DataLoad(_)));
    }
}
