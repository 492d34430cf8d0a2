//! Physical units with type safety.
//!
//! These newtypes provide compile-time unit checking to prevent
//! mixing incompatible quantities (e.g., adding Volts to Amps).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Voltage in Volts.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Volts(pub f64);

impl Volts {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn from_mv(mv: f64) -> Self {
        Self(mv * 1e-3)
    }

    #[inline]
    pub fn as_mv(&self) -> f64 {
        self.0 * 1e3
    }
}

impl Add for Volts {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Volts {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for Volts {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<f64> for Volts {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self(self.0 / rhs)
    }
}

/// Ratio of two voltages.
impl Div<Volts> for Volts {
    type Output = f64;
    fn div(self, rhs: Volts) -> f64 {
        self.0 / rhs.0
    }
}

impl fmt::Display for Volts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} V", self.0)
    }
}

/// Current in Amps.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Amps(pub f64);

impl Amps {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn from_ma(ma: f64) -> Self {
        Self(ma * 1e-3)
    }

    #[inline]
    pub fn as_ma(&self) -> f64 {
        self.0 * 1e3
    }
}

impl Add for Amps {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amps {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Amps {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<f64> for Amps {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl fmt::Display for Amps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} A", self.0)
    }
}

/// Temperature in degrees Celsius.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Celsius(pub f64);

impl Celsius {
    /// Room temperature, the usual typical corner.
    pub const ROOM: Self = Self(25.0);

    #[inline]
    pub fn as_kelvin(&self) -> f64 {
        self.0 + 273.15
    }
}

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} C", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voltage_ratio() {
        let ratio = (Volts(3.0) - Volts(1.0)) / (Volts(2.0) - Volts(1.0));
        assert_eq!(ratio, 2.0);
    }

    #[test]
    fn test_milli_conversions() {
        assert!((Volts::from_mv(800.0).0 - 0.8).abs() < 1e-12);
        assert!((Amps::from_ma(-20.0).0 + 0.02).abs() < 1e-12);
        assert!((Amps(0.015).as_ma() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_celsius_to_kelvin() {
        assert!((Celsius::ROOM.as_kelvin() - 298.15).abs() < 1e-9);
    }
}
