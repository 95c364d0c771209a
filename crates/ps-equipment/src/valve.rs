//! Heating or cooling coil valve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ps_core::{ClockRef, PointValue};
use ps_transient::{InputSource, System, TransientConfig, TransientElement, ValueCommandElement};

use crate::error::{EquipmentError, EquipmentResult};
use crate::traits::Equipment;

/// Whether opening the valve heats or cools the airstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValveMode {
    #[default]
    Heating,
    Cooling,
}

impl FromStr for ValveMode {
    type Err = EquipmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heating" => Ok(Self::Heating),
            "cooling" => Ok(Self::Cooling),
            other => Err(EquipmentError::invalid(format!(
                "valve mode must be 'heating' or 'cooling', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ValveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heating => write!(f, "heating"),
            Self::Cooling => write!(f, "cooling"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValveConfig {
    pub mode: ValveMode,
    pub modulation: f64,
    pub entering_temp: f64,
    pub max_flow: f64,
    /// Temperature change across the coil at full opening.
    pub delta_t: f64,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub tau: f64,
}

impl Default for ValveConfig {
    fn default() -> Self {
        Self {
            mode: ValveMode::Heating,
            modulation: 100.0,
            entering_temp: 0.0,
            max_flow: 400.0,
            delta_t: 10.0,
            min_temperature: None,
            max_temperature: None,
            tau: 10.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Valve {
    name: String,
    description: String,
    config: ValveConfig,
    modulation: InputSource,
    entering_temp: InputSource,
    temperature: TransientElement,
    flow: TransientElement,
}

impl Valve {
    pub const READINGS: [&'static str; 2] = ["leaving_temp", "leaving_flow"];

    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        config: ValveConfig,
        clock: ClockRef,
    ) -> EquipmentResult<Self> {
        if config.max_flow < 0.0 {
            return Err(EquipmentError::invalid("max_flow must be non-negative"));
        }
        let name = name.into();

        let mut temp_config = TransientConfig::new(config.delta_t, config.tau);
        temp_config.min_output = config.min_temperature;
        temp_config.max_output = config.max_temperature;
        if config.mode == ValveMode::Cooling {
            temp_config = temp_config.decreasing();
        }
        let temperature = TransientElement::new(
            format!("{name} leaving temp"),
            ValueCommandElement::new(config.entering_temp, 0.0),
            temp_config,
            clock.clone(),
        )?;

        // Opening always adds flow, whatever the mode.
        let flow_config = TransientConfig::new(config.max_flow, config.tau / 2.0)
            .with_min_output(0.0)
            .with_max_output(config.max_flow);
        let flow = TransientElement::new(
            format!("{name} leaving flow"),
            ValueCommandElement::new(0.0, 0.0),
            flow_config,
            clock,
        )?;

        Ok(Self {
            name,
            description: description.into(),
            modulation: config.modulation.into(),
            entering_temp: config.entering_temp.into(),
            config,
            temperature,
            flow,
        })
    }

    /// Build from a mode name, as found in hand-written configs.
    pub fn with_mode_name(
        name: impl Into<String>,
        description: impl Into<String>,
        mode: &str,
        config: ValveConfig,
        clock: ClockRef,
    ) -> EquipmentResult<Self> {
        let mode = mode.parse()?;
        Self::new(name, description, ValveConfig { mode, ..config }, clock)
    }

    pub fn config(&self) -> &ValveConfig {
        &self.config
    }

    pub fn mode(&self) -> ValveMode {
        self.config.mode
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_modulation(&mut self, modulation: impl Into<InputSource>) -> EquipmentResult<()> {
        self.modulation = modulation.into();
        self.refresh()
    }

    pub fn set_entering_temp(&mut self, temp: impl Into<InputSource>) -> EquipmentResult<()> {
        self.entering_temp = temp.into();
        self.refresh()
    }

    pub fn leaving_temp(&self) -> f64 {
        self.temperature.last_value().unwrap_or(self.config.entering_temp)
    }

    pub fn leaving_flow(&self) -> f64 {
        self.flow.last_value().unwrap_or(0.0)
    }
}

impl Equipment for Valve {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn refresh(&mut self) -> EquipmentResult<()> {
        let modulation = self.modulation.resolve_modulation()?;
        let entering = self.entering_temp.resolve()?;

        self.flow.set_command(modulation)?;
        self.temperature.set_value(entering);
        self.temperature.set_command(modulation.max(0.0))?;

        self.temperature.output()?;
        self.flow.output()?;
        Ok(())
    }

    fn value(&self, key: &str) -> EquipmentResult<PointValue> {
        match key {
            "leaving_temp" => Ok(self.leaving_temp().into()),
            "leaving_flow" => Ok(self.leaving_flow().into()),
            _ => Err(EquipmentError::unknown_reading(&self.name, key)),
        }
    }

    fn reading_names(&self) -> Vec<String> {
        Self::READINGS.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::ManualClock;

    #[test]
    fn heating_valve_raises_temperature() {
        let clock = ManualClock::new(0.0);
        let config = ValveConfig {
            entering_temp: 15.0,
            ..ValveConfig::default()
        };
        let mut v = Valve::new("V_1", "", config, clock.handle()).unwrap();
        v.refresh().unwrap();
        assert_eq!(v.leaving_temp(), 15.0);
        clock.advance(100.0);
        v.refresh().unwrap();
        assert_eq!(v.leaving_temp(), 25.0);
        assert_eq!(v.leaving_flow(), 400.0);
    }

    #[test]
    fn cooling_valve_lowers_temperature_but_still_flows() {
        let clock = ManualClock::new(0.0);
        let config = ValveConfig {
            mode: ValveMode::Cooling,
            entering_temp: 25.0,
            min_temperature: Some(18.0),
            ..ValveConfig::default()
        };
        let mut v = Valve::new("V_2", "", config, clock.handle()).unwrap();
        v.refresh().unwrap();
        clock.advance(100.0);
        v.refresh().unwrap();
        assert_eq!(v.leaving_temp(), 18.0);
        assert_eq!(v.leaving_flow(), 400.0);
    }

    #[test]
    fn closing_returns_to_entering_temp() {
        let clock = ManualClock::new(0.0);
        let mut v = Valve::new("V_1", "", ValveConfig::default(), clock.handle()).unwrap();
        v.refresh().unwrap();
        clock.advance(100.0);
        v.set_modulation(0.0).unwrap();
        clock.advance(100.0);
        v.refresh().unwrap();
        assert_eq!(v.leaving_temp(), 0.0);
        assert_eq!(v.leaving_flow(), 0.0);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let clock = ManualClock::new(0.0);
        let err = Valve::with_mode_name("V_3", "", "venting", ValveConfig::default(), clock.handle())
            .unwrap_err();
        assert!(matches!(err, EquipmentError::InvalidArg { .. }));
        assert_eq!("Cooling".parse::<ValveMode>().unwrap(), ValveMode::Cooling);
    }
}
