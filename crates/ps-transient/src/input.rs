//! Input descriptors consumed by systems on every evaluation.
//!
//! A leaf input is an [`InputSource`]: a constant, a callback, another
//! system, or an external point. Sources are grouped into descriptors that
//! tell a system how to interpret them: a bare value, a value with a command
//! (sensor + modulation), or a value with a quantity (for mixing).

use std::fmt;
use std::rc::Rc;

use ps_core::{PointRef, ensure_finite};

use crate::error::{SimError, SimResult};
use crate::system::SystemRef;

/// Where a numeric input comes from.
#[derive(Clone)]
pub enum InputSource {
    Constant(f64),
    Callback(Rc<dyn Fn() -> f64>),
    Nested(SystemRef),
    External(PointRef),
}

impl InputSource {
    pub fn callback(f: impl Fn() -> f64 + 'static) -> Self {
        Self::Callback(Rc::new(f))
    }

    pub fn nested(system: SystemRef) -> Self {
        Self::Nested(system)
    }

    pub fn point(point: PointRef) -> Self {
        Self::External(point)
    }

    /// Current numeric value.
    ///
    /// Nested systems are evaluated; external binary points are a type
    /// mismatch.
    pub fn resolve(&self) -> SimResult<f64> {
        let v = match self {
            Self::Constant(v) => *v,
            Self::Callback(f) => f(),
            Self::Nested(system) => {
                let mut system = system.try_borrow_mut().map_err(|_| SimError::CyclicReference {
                    name: "nested system".to_string(),
                })?;
                system.output()?
            }
            Self::External(point) => point.current_value().as_analog()?,
        };
        Ok(ensure_finite(v, "input value")?)
    }

    /// Like [`resolve`](Self::resolve), but binary points read as 0 / 100 %.
    pub fn resolve_modulation(&self) -> SimResult<f64> {
        match self {
            Self::External(point) => Ok(ensure_finite(point.current_value().as_percent(), "modulation")?),
            other => other.resolve(),
        }
    }
}

impl Default for InputSource {
    fn default() -> Self {
        Self::Constant(0.0)
    }
}

impl From<f64> for InputSource {
    fn from(v: f64) -> Self {
        Self::Constant(v)
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
            Self::Nested(system) => match system.try_borrow() {
                Ok(system) => f.debug_tuple("Nested").field(&system.name()).finish(),
                Err(_) => f.write_str("Nested(<in use>)"),
            },
            Self::External(point) => f.debug_tuple("External").field(point).finish(),
        }
    }
}

/// A value paired with a 0–100 % command (SCR + inlet temperature, VFD + pressure...).
#[derive(Debug, Clone, Default)]
pub struct ValueCommandElement {
    pub value: InputSource,
    pub command: InputSource,
}

impl ValueCommandElement {
    pub fn new(value: impl Into<InputSource>, command: impl Into<InputSource>) -> Self {
        Self {
            value: value.into(),
            command: command.into(),
        }
    }

    pub fn resolve(&self) -> SimResult<(f64, f64)> {
        Ok((self.value.resolve()?, self.command.resolve()?))
    }
}

/// A value paired with the quantity it represents in a mix (temperature + airflow share...).
#[derive(Debug, Clone, Default)]
pub struct MixInputElement {
    pub value: InputSource,
    pub quantity: InputSource,
}

impl MixInputElement {
    pub fn new(value: impl Into<InputSource>, quantity: impl Into<InputSource>) -> Self {
        Self {
            value: value.into(),
            quantity: quantity.into(),
        }
    }

    pub fn resolve(&self) -> SimResult<(f64, f64)> {
        Ok((self.value.resolve()?, self.quantity.resolve()?))
    }
}

/// Shape of a system's input.
#[derive(Debug, Clone)]
pub enum InputDescriptor {
    Value(InputSource),
    ValueCommand(ValueCommandElement),
    Mix(MixInputElement),
}

/// An [`InputDescriptor`] with every source resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved {
    Value(f64),
    ValueCommand { value: f64, command: f64 },
    Mix { value: f64, quantity: f64 },
}

impl InputDescriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value input",
            Self::ValueCommand(_) => "value-command input",
            Self::Mix(_) => "mix input",
        }
    }

    pub fn resolve(&self) -> SimResult<Resolved> {
        Ok(match self {
            Self::Value(source) => Resolved::Value(source.resolve()?),
            Self::ValueCommand(element) => {
                let (value, command) = element.resolve()?;
                Resolved::ValueCommand { value, command }
            }
            Self::Mix(element) => {
                let (value, quantity) = element.resolve()?;
                Resolved::Mix { value, quantity }
            }
        })
    }

    pub fn value(&self) -> &InputSource {
        match self {
            Self::Value(source) => source,
            Self::ValueCommand(element) => &element.value,
            Self::Mix(element) => &element.value,
        }
    }

    pub fn set_value(&mut self, source: impl Into<InputSource>) {
        let source = source.into();
        match self {
            Self::Value(value) => *value = source,
            Self::ValueCommand(element) => element.value = source,
            Self::Mix(element) => element.value = source,
        }
    }

    /// Replace the command source. Only value-command inputs have one.
    pub fn set_command(&mut self, source: impl Into<InputSource>) -> SimResult<()> {
        match self {
            Self::ValueCommand(element) => {
                element.command = source.into();
                Ok(())
            }
            other => Err(SimError::TypeMismatch {
                expected: "value-command input",
                found: other.kind(),
            }),
        }
    }
}

impl From<ValueCommandElement> for InputDescriptor {
    fn from(element: ValueCommandElement) -> Self {
        Self::ValueCommand(element)
    }
}

impl From<MixInputElement> for InputDescriptor {
    fn from(element: MixInputElement) -> Self {
        Self::Mix(element)
    }
}

impl From<InputSource> for InputDescriptor {
    fn from(source: InputSource) -> Self {
        Self::Value(source)
    }
}

impl From<f64> for InputDescriptor {
    fn from(v: f64) -> Self {
        Self::Value(InputSource::Constant(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::SimPoint;
    use std::cell::Cell;

    #[test]
    fn constant_and_callback() {
        assert_eq!(InputSource::from(3.0).resolve().unwrap(), 3.0);

        let cell = Rc::new(Cell::new(1.0));
        let shared_cell = cell.clone();
        let source = InputSource::callback(move || shared_cell.get());
        cell.set(7.5);
        assert_eq!(source.resolve().unwrap(), 7.5);
    }

    #[test]
    fn external_point_is_read_live() {
        let point = SimPoint::shared("OAT", 4.0);
        let source = InputSource::point(point.clone());
        assert_eq!(source.resolve().unwrap(), 4.0);
        point.set(-3.0);
        assert_eq!(source.resolve().unwrap(), -3.0);
    }

    #[test]
    fn binary_point_needs_modulation_view() {
        let point = SimPoint::shared("DX-1 C", true);
        let source = InputSource::point(point);
        assert!(matches!(source.resolve(), Err(SimError::TypeMismatch { .. })));
        assert_eq!(source.resolve_modulation().unwrap(), 100.0);
    }

    #[test]
    fn non_finite_input_rejected() {
        let source = InputSource::callback(|| f64::NAN);
        assert!(matches!(source.resolve(), Err(SimError::NonPhysical { .. })));
    }

    #[test]
    fn command_only_on_value_command() {
        let mut desc = InputDescriptor::from(MixInputElement::new(20.0, 10.0));
        let err = desc.set_command(50.0).unwrap_err();
        assert!(matches!(
            err,
            SimError::TypeMismatch {
                expected: "value-command input",
                found: "mix input"
            }
        ));

        let mut desc = InputDescriptor::from(ValueCommandElement::new(20.0, 0.0));
        desc.set_command(50.0).unwrap();
        assert_eq!(
            desc.resolve().unwrap(),
            Resolved::ValueCommand {
                value: 20.0,
                command: 50.0
            }
        );
    }
}
