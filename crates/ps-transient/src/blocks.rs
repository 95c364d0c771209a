//! Stateless helper systems.
//!
//! These have no transient behavior: the output is a direct function of the
//! inputs at the time of the read. They are typically cascaded into a
//! [`TransientElement`](crate::TransientElement) or used to derive one input
//! from others.

use ps_core::units::{air_heating_delta_t, btuh_to_kw, cfm_to_lps, kw, lps};
use uom::si::temperature_interval::kelvin;

use crate::error::{SimError, SimResult};
use crate::input::{InputSource, MixInputElement, ValueCommandElement};
use crate::system::{System, SystemState};

/// Sum of one or more inputs.
#[derive(Debug, Clone)]
pub struct Add {
    state: SystemState,
    inputs: Vec<InputSource>,
}

impl Add {
    pub fn new(name: impl Into<String>, inputs: Vec<InputSource>) -> SimResult<Self> {
        if inputs.is_empty() {
            return Err(SimError::config("ADD needs at least one input"));
        }
        Ok(Self {
            state: SystemState::new(name),
            inputs,
        })
    }
}

impl System for Add {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn output(&mut self) -> SimResult<f64> {
        let mut total = 0.0;
        for input in &self.inputs {
            total += input.resolve()?;
        }
        Ok(self.state.record(total))
    }
}

/// First input minus the second.
#[derive(Debug, Clone)]
pub struct Sub {
    state: SystemState,
    minuend: InputSource,
    subtrahend: InputSource,
}

impl Sub {
    pub fn new(name: impl Into<String>, inputs: Vec<InputSource>) -> SimResult<Self> {
        let [minuend, subtrahend]: [InputSource; 2] = inputs
            .try_into()
            .map_err(|_| SimError::config("SUB needs exactly two inputs"))?;
        Ok(Self {
            state: SystemState::new(name),
            minuend,
            subtrahend,
        })
    }
}

impl System for Sub {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn output(&mut self) -> SimResult<f64> {
        let v = self.minuend.resolve()? - self.subtrahend.resolve()?;
        Ok(self.state.record(v))
    }
}

/// Forwards its input unchanged.
#[derive(Debug, Clone)]
pub struct Passthru {
    state: SystemState,
    input: InputSource,
}

impl Passthru {
    pub fn new(name: impl Into<String>, input: impl Into<InputSource>) -> Self {
        Self {
            state: SystemState::new(name),
            input: input.into(),
        }
    }

    pub fn set_input(&mut self, input: impl Into<InputSource>) {
        self.input = input.into();
    }
}

impl System for Passthru {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn output(&mut self) -> SimResult<f64> {
        let v = self.input.resolve()?;
        Ok(self.state.record(v))
    }
}

/// Picks one of several inputs by (rounded) index.
#[derive(Debug, Clone)]
pub struct Select {
    state: SystemState,
    selector: InputSource,
    inputs: Vec<InputSource>,
}

impl Select {
    pub fn new(
        name: impl Into<String>,
        selector: impl Into<InputSource>,
        inputs: Vec<InputSource>,
    ) -> SimResult<Self> {
        if inputs.is_empty() {
            return Err(SimError::config("SELECT needs at least one input"));
        }
        Ok(Self {
            state: SystemState::new(name),
            selector: selector.into(),
            inputs,
        })
    }

    pub fn set_selector(&mut self, selector: impl Into<InputSource>) {
        self.selector = selector.into();
    }
}

impl System for Select {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn output(&mut self) -> SimResult<f64> {
        let index = self.selector.resolve()?.round();
        if index < 0.0 || index >= self.inputs.len() as f64 {
            return Err(SimError::non_physical(format!(
                "selector {index} outside 0..{}",
                self.inputs.len()
            )));
        }
        let v = self.inputs[index as usize].resolve()?;
        Ok(self.state.record(v))
    }
}

/// `value + command/100 × delta_max`, applied instantly.
#[derive(Debug, Clone)]
pub struct Linear {
    state: SystemState,
    input: ValueCommandElement,
    delta_max: f64,
}

impl Linear {
    pub fn new(name: impl Into<String>, input: ValueCommandElement, delta_max: f64) -> Self {
        Self {
            state: SystemState::new(name),
            input,
            delta_max,
        }
    }

    pub fn set_value(&mut self, source: impl Into<InputSource>) {
        self.input.value = source.into();
    }

    pub fn set_command(&mut self, source: impl Into<InputSource>) {
        self.input.command = source.into();
    }
}

impl System for Linear {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn output(&mut self) -> SimResult<f64> {
        let (sensor, command) = self.input.resolve()?;
        let v = sensor + command / 100.0 * self.delta_max;
        Ok(self.state.record(v))
    }
}

/// `value − command/100 × delta_max`, optionally floored.
///
/// The floor models coils that cannot cool below the supply water temperature.
#[derive(Debug, Clone)]
pub struct Cool {
    state: SystemState,
    input: ValueCommandElement,
    delta_max: f64,
    min_output: Option<f64>,
}

impl Cool {
    pub fn new(
        name: impl Into<String>,
        input: ValueCommandElement,
        delta_max: f64,
        min_output: Option<f64>,
    ) -> Self {
        Self {
            state: SystemState::new(name),
            input,
            delta_max,
            min_output,
        }
    }

    pub fn set_value(&mut self, source: impl Into<InputSource>) {
        self.input.value = source.into();
    }

    pub fn set_command(&mut self, source: impl Into<InputSource>) {
        self.input.command = source.into();
    }
}

impl System for Cool {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn output(&mut self) -> SimResult<f64> {
        let (sensor, command) = self.input.resolve()?;
        let mut v = sensor - command / 100.0 * self.delta_max;
        if let Some(min) = self.min_output {
            v = v.max(min);
        }
        Ok(self.state.record(v))
    }
}

/// Heater rating, in either unit system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaterPower {
    Kw(f64),
    BtuPerHour(f64),
}

impl HeaterPower {
    pub fn kw(self) -> f64 {
        match self {
            Self::Kw(v) => v,
            Self::BtuPerHour(v) => btuh_to_kw(v),
        }
    }
}

/// Airflow through a heater, in either unit system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Airflow {
    Lps(f64),
    Cfm(f64),
}

impl Airflow {
    pub fn lps(self) -> f64 {
        match self {
            Self::Lps(v) => v,
            Self::Cfm(v) => cfm_to_lps(v),
        }
    }
}

/// Electric heater (SCR): raises the inlet temperature by the rise that
/// `power × command%` produces in the airstream.
#[derive(Debug, Clone)]
pub struct Heat {
    state: SystemState,
    input: ValueCommandElement,
    power_kw: f64,
    flow_lps: f64,
}

impl Heat {
    pub fn new(
        name: impl Into<String>,
        input: ValueCommandElement,
        power: HeaterPower,
        flow: Airflow,
    ) -> SimResult<Self> {
        let power_kw = power.kw();
        let flow_lps = flow.lps();
        if !power_kw.is_finite() || power_kw < 0.0 {
            return Err(SimError::config("heater power must be non-negative"));
        }
        if !flow_lps.is_finite() || flow_lps <= 0.0 {
            return Err(SimError::config("heater airflow must be positive"));
        }
        Ok(Self {
            state: SystemState::new(name),
            input,
            power_kw,
            flow_lps,
        })
    }

    pub fn power_kw(&self) -> f64 {
        self.power_kw
    }

    pub fn flow_lps(&self) -> f64 {
        self.flow_lps
    }

    pub fn set_value(&mut self, source: impl Into<InputSource>) {
        self.input.value = source.into();
    }

    pub fn set_command(&mut self, source: impl Into<InputSource>) {
        self.input.command = source.into();
    }
}

impl System for Heat {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn output(&mut self) -> SimResult<f64> {
        let (temp, command) = self.input.resolve()?;
        let rise = air_heating_delta_t(kw(self.power_kw * command / 100.0), lps(self.flow_lps));
        let v = temp + rise.get::<kelvin>();
        Ok(self.state.record(v))
    }
}

/// Weighted average of two streams: `(V1·Q1 + V2·Q2) / (Q1 + Q2)`.
#[derive(Debug, Clone)]
pub struct Mix {
    state: SystemState,
    first: MixInputElement,
    second: MixInputElement,
}

impl Mix {
    pub fn new(name: impl Into<String>, first: MixInputElement, second: MixInputElement) -> Self {
        Self {
            state: SystemState::new(name),
            first,
            second,
        }
    }

    pub fn first_mut(&mut self) -> &mut MixInputElement {
        &mut self.first
    }

    pub fn second_mut(&mut self) -> &mut MixInputElement {
        &mut self.second
    }
}

impl System for Mix {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn output(&mut self) -> SimResult<f64> {
        let (v1, q1) = self.first.resolve()?;
        let (v2, q2) = self.second.resolve()?;
        let total = q1 + q2;
        if total.abs() < f64::EPSILON {
            return Err(SimError::non_physical(format!(
                "{}: mixed quantities sum to zero",
                self.state.name()
            )));
        }
        Ok(self.state.record((v1 * q1 + v2 * q2) / total))
    }
}
