//! Field-point abstraction consumed and fed by the simulation.
//!
//! The simulator never talks to a controller itself. Anything exposing a
//! current value can be read as an input ([`PointSource`]); anything
//! accepting a write can receive an equipment reading ([`PointSink`]).

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::error::{CoreError, CoreResult};

/// Value carried by a field point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum PointValue {
    Analog(f64),
    Binary(bool),
}

impl PointValue {
    /// Numeric view. Binary values are a type mismatch.
    pub fn as_analog(&self) -> CoreResult<f64> {
        match self {
            Self::Analog(v) => Ok(*v),
            Self::Binary(_) => Err(CoreError::TypeMismatch {
                expected: "analog value",
                found: "binary value",
            }),
        }
    }

    /// Numeric view where `true` reads as 100 % and `false` as 0 %.
    pub fn as_percent(&self) -> f64 {
        match self {
            Self::Analog(v) => *v,
            Self::Binary(true) => 100.0,
            Self::Binary(false) => 0.0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Analog(_) => "analog value",
            Self::Binary(_) => "binary value",
        }
    }
}

impl From<f64> for PointValue {
    fn from(v: f64) -> Self {
        Self::Analog(v)
    }
}

impl From<bool> for PointValue {
    fn from(v: bool) -> Self {
        Self::Binary(v)
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Analog(v) => write!(f, "{v:.3}"),
            Self::Binary(true) => write!(f, "active"),
            Self::Binary(false) => write!(f, "inactive"),
        }
    }
}

/// Anything with a readable current value.
pub trait PointSource: fmt::Debug {
    fn current_value(&self) -> PointValue;
}

/// Anything that accepts a value written by the simulation.
pub trait PointSink: fmt::Debug {
    fn write(&self, value: PointValue) -> CoreResult<()>;
}

/// Shared handle to a readable point.
pub type PointRef = Rc<dyn PointSource>;

/// In-memory point, readable and writable.
#[derive(Debug)]
pub struct SimPoint {
    name: String,
    value: Cell<PointValue>,
}

impl SimPoint {
    pub fn new(name: impl Into<String>, initial: impl Into<PointValue>) -> Self {
        Self {
            name: name.into(),
            value: Cell::new(initial.into()),
        }
    }

    pub fn shared(name: impl Into<String>, initial: impl Into<PointValue>) -> Rc<Self> {
        Rc::new(Self::new(name, initial))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&self, value: impl Into<PointValue>) {
        self.value.set(value.into());
    }
}

impl PointSource for SimPoint {
    fn current_value(&self) -> PointValue {
        self.value.get()
    }
}

impl PointSink for SimPoint {
    fn write(&self, value: PointValue) -> CoreResult<()> {
        if let PointValue::Analog(v) = value {
            crate::numeric::ensure_finite(v, "point value")?;
        }
        self.value.set(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_is_not_analog() {
        let err = PointValue::Binary(true).as_analog().unwrap_err();
        assert!(matches!(err, CoreError::TypeMismatch { .. }));
        assert_eq!(PointValue::Binary(true).as_percent(), 100.0);
        assert_eq!(PointValue::Binary(false).as_percent(), 0.0);
    }

    #[test]
    fn sim_point_write_then_read() {
        let p = SimPoint::new("AHU-1 SAT", 12.0);
        p.write(PointValue::Analog(13.5)).unwrap();
        assert_eq!(p.current_value(), PointValue::Analog(13.5));
        assert!(p.write(PointValue::Analog(f64::NAN)).is_err());
    }
}
