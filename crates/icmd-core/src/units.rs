// icmd-core/src/units.rs

//! Unit handling for extracted quantities.
//!
//! Every conversion in the workspace goes through this module. Values are
//! lifted into uom quantities in their source unit and read back in the
//! requested one; uom owns the conversion factors.

use std::fmt;
use std::str::FromStr;

use uom::si::f64::{
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
};

use crate::error::UnitError;

// Public canonical unit types (SI, f64)
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

/// Raw conversion factors, checked against uom in tests. Conversions do
/// not read these.
pub mod constants {
    /// K = C + KELVIN_OFFSET
    pub const KELVIN_OFFSET: f64 = 273.15;
    /// 1 atm in Pa
    pub const PA_PER_ATM: f64 = 101_325.0;
    /// 1 bar in Pa
    pub const PA_PER_BAR: f64 = 100_000.0;
}

/// Quantity family a unit string is parsed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Temperature,
    Pressure,
    FractionBasis,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Pressure => write!(f, "pressure"),
            Self::FractionBasis => write!(f, "fraction basis"),
        }
    }
}

/// Temperature units accepted by the extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Kelvin,
}

impl TemperatureUnit {
    pub const ALL: [TemperatureUnit; 2] = [Self::Celsius, Self::Kelvin];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Kelvin => "K",
        }
    }

    /// Lift a raw value expressed in this unit into a uom temperature.
    pub fn quantity(self, value: f64) -> Temperature {
        use uom::si::thermodynamic_temperature::degree_celsius;
        match self {
            Self::Celsius => Temperature::new::<degree_celsius>(value),
            Self::Kelvin => k(value),
        }
    }

    /// Read a uom temperature back in this unit.
    pub fn value_of(self, t: Temperature) -> f64 {
        use uom::si::thermodynamic_temperature::{degree_celsius, kelvin};
        match self {
            Self::Celsius => t.get::<degree_celsius>(),
            Self::Kelvin => t.get::<kelvin>(),
        }
    }

    /// Convert `value` from `self` to `to`. Same-unit requests return the
    /// input untouched.
    pub fn convert(self, value: f64, to: TemperatureUnit) -> f64 {
        if self == to {
            return value;
        }
        to.value_of(self.quantity(value))
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TemperatureUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "°c" | "celsius" => Ok(Self::Celsius),
            "k" | "kelvin" => Ok(Self::Kelvin),
            _ => Err(UnitError::Unsupported {
                unit: s.to_string(),
                quantity: Quantity::Temperature,
                expected: "C, K",
            }),
        }
    }
}

/// Pressure units accepted by the extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PressureUnit {
    #[default]
    Pascal,
    Atmosphere,
    Bar,
}

impl PressureUnit {
    pub const ALL: [PressureUnit; 3] = [Self::Pascal, Self::Atmosphere, Self::Bar];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Pascal => "Pa",
            Self::Atmosphere => "atm",
            Self::Bar => "bar",
        }
    }

    pub fn quantity(self, value: f64) -> Pressure {
        use uom::si::pressure::{atmosphere, bar};
        match self {
            Self::Pascal => pa(value),
            Self::Atmosphere => Pressure::new::<atmosphere>(value),
            Self::Bar => Pressure::new::<bar>(value),
        }
    }

    pub fn value_of(self, p: Pressure) -> f64 {
        use uom::si::pressure::{atmosphere, bar, pascal};
        match self {
            Self::Pascal => p.get::<pascal>(),
            Self::Atmosphere => p.get::<atmosphere>(),
            Self::Bar => p.get::<bar>(),
        }
    }

    pub fn convert(self, value: f64, to: PressureUnit) -> f64 {
        if self == to {
            return value;
        }
        to.value_of(self.quantity(value))
    }
}

impl fmt::Display for PressureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for PressureUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pa" | "pascal" => Ok(Self::Pascal),
            "atm" | "atmosphere" => Ok(Self::Atmosphere),
            "bar" => Ok(Self::Bar),
            _ => Err(UnitError::Unsupported {
                unit: s.to_string(),
                quantity: Quantity::Pressure,
                expected: "Pa, atm, bar",
            }),
        }
    }
}

/// Basis of phase fractions and compositions: the tool reports every value
/// as a `[mole, mass]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FractionBasis {
    #[default]
    Mole,
    Mass,
}

impl FractionBasis {
    pub const ALL: [FractionBasis; 2] = [Self::Mole, Self::Mass];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Mole => "mole",
            Self::Mass => "mass",
        }
    }

    /// Position of this basis inside a `[mole, mass]` pair.
    pub fn index(self) -> usize {
        match self {
            Self::Mole => 0,
            Self::Mass => 1,
        }
    }
}

impl fmt::Display for FractionBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for FractionBasis {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mole" | "mol" | "molar" => Ok(Self::Mole),
            "mass" | "weight" => Ok(Self::Mass),
            _ => Err(UnitError::Unsupported {
                unit: s.to_string(),
                quantity: Quantity::FractionBasis,
                expected: "mole, mass",
            }),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::numeric::Tolerance;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn celsius_kelvin_round_trip(c in -273.0_f64..5000.0_f64) {
            let k = TemperatureUnit::Celsius.convert(c, TemperatureUnit::Kelvin);
            let back = TemperatureUnit::Kelvin.convert(k, TemperatureUnit::Celsius);
            let tol = Tolerance::new(1e-9, 1e-12);
            prop_assert!(tol.matches(back, c));
        }

        #[test]
        fn pressure_round_trip(p in 0.0_f64..1.0e8_f64) {
            let tol = Tolerance::new(1e-9, 1e-12);
            for unit in PressureUnit::ALL {
                let there = PressureUnit::Pascal.convert(p, unit);
                let back = unit.convert(there, PressureUnit::Pascal);
                prop_assert!(tol.matches(back, p));
            }
        }
    }
}
