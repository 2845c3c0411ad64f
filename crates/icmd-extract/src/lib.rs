//! icmd-extract: typed views and tables over validated ICMD documents.
//!
//! Layers, leaf-first:
//! - [`catalog`]: model/element listing and lookup
//! - [`model_view`]: flattened parameters of one model
//! - [`phases`]: step-aligned phase fractions and temperatures
//! - [`solidification`] / [`equilibrium`]: unit-aware domain tables
//! - [`composition`] / [`study`]: phase compositions, study inputs and
//!   per-sample tables
//! - [`table`]: CSV export of the rectangular results

pub mod catalog;
pub mod composition;
pub mod equilibrium;
pub mod error;
pub mod model_view;
pub mod phases;
pub mod solidification;
pub mod study;
pub mod table;
pub mod types;

pub use catalog::{Catalog, ModelSummary};
pub use composition::Composition;
pub use equilibrium::Equilibrium;
pub use error::{ExtractError, ExtractResult};
pub use model_view::ModelView;
pub use phases::{ABSENT_PHASE_FRACTION, PhaseTemperatureExtractor};
pub use solidification::{ScheilOptions, Solidification};
pub use study::ParameterStudy;
pub use table::CsvTable;
pub use types::*;

pub use icmd_core::{FractionBasis, PressureUnit, TemperatureUnit};
pub use icmd_document::{LoadOptions, Step, StepValue};
