use thiserror::Error;

use crate::units::Quantity;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// Unit string that could not be mapped onto a supported unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Unsupported {quantity} unit '{unit}' (expected one of: {expected})")]
    Unsupported {
        unit: String,
        quantity: Quantity,
        expected: &'static str,
    },
}
