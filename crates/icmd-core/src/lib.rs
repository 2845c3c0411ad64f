//! icmd-core: shared foundation for the ICMD output readers.
//!
//! Contains:
//! - units (uom SI types, unit enums and the conversion table)
//! - numeric (tolerance comparison, finiteness check)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult, UnitError};
pub use numeric::{Tolerance, ensure_finite};
pub use units::*;
