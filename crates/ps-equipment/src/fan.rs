//! Fan (and pump) model.

use serde::{Deserialize, Serialize};

use ps_core::{ClockRef, PointValue};
use ps_transient::{InputSource, System, TransientConfig, TransientElement, ValueCommandElement};

use crate::device::OnOffDevice;
use crate::error::{EquipmentError, EquipmentResult};
use crate::traits::Equipment;

/// Fan parameters. Pumps use the same set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    pub start_command: bool,
    /// Speed command in % while running.
    pub modulation: f64,
    /// Pressure seen at the inlet when stopped.
    pub suction_pressure: f64,
    /// Pressure rise at 100 % speed.
    pub delta_p: f64,
    /// Flow at 100 % speed.
    pub max_flow: f64,
    pub max_amperage: f64,
    /// Spin-up time constant, seconds.
    pub tau: f64,
    pub random_error: Option<f64>,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            start_command: false,
            modulation: 100.0,
            suction_pressure: 0.0,
            delta_p: 150.0,
            max_flow: 2000.0,
            max_amperage: 1.0,
            tau: 2.0,
            random_error: Some(0.1),
        }
    }
}

/// Motor-driven air or water mover.
///
/// A single transient models the speed (0–100 %); flow, pressure and
/// amperage scale linearly with it.
#[derive(Debug, Clone)]
pub struct Fan {
    device: OnOffDevice,
    description: String,
    config: FanConfig,
    modulation: InputSource,
    speed: TransientElement,
}

/// Pumps behave exactly like fans.
pub type Pump = Fan;

impl Fan {
    pub const READINGS: [&'static str; 4] = ["flow", "pressure", "amperage", "status"];

    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        config: FanConfig,
        clock: ClockRef,
    ) -> EquipmentResult<Self> {
        if config.max_flow < 0.0 || config.max_amperage < 0.0 {
            return Err(EquipmentError::invalid(
                "max_flow and max_amperage must be non-negative",
            ));
        }
        let name = name.into();
        let mut transient = TransientConfig::new(100.0, config.tau)
            .with_min_output(0.0)
            .with_max_output(100.0);
        transient.random_error = config.random_error;
        let speed = TransientElement::new(
            name.clone(),
            ValueCommandElement::new(0.0, 0.0),
            transient,
            clock,
        )?;

        Ok(Self {
            device: OnOffDevice::new(name, config.start_command),
            description: description.into(),
            modulation: config.modulation.into(),
            config,
            speed,
        })
    }

    pub fn config(&self) -> &FanConfig {
        &self.config
    }

    pub fn device(&self) -> &OnOffDevice {
        &self.device
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.device.set_name(name);
    }

    /// Speed command while running. Accepts a constant, a point or a system.
    pub fn set_modulation(&mut self, modulation: impl Into<InputSource>) -> EquipmentResult<()> {
        self.modulation = modulation.into();
        self.refresh()
    }

    pub fn set_delta_p(&mut self, delta_p: f64) -> EquipmentResult<()> {
        self.config.delta_p = delta_p;
        self.refresh()
    }

    pub fn set_suction_pressure(&mut self, pressure: f64) -> EquipmentResult<()> {
        self.config.suction_pressure = pressure;
        self.refresh()
    }

    pub fn set_max_flow(&mut self, max_flow: f64) -> EquipmentResult<()> {
        if max_flow < 0.0 {
            return Err(EquipmentError::invalid("max_flow must be non-negative"));
        }
        self.config.max_flow = max_flow;
        self.refresh()
    }

    pub fn status(&self) -> bool {
        self.device.status()
    }

    /// Current speed in %, as of the last refresh.
    pub fn speed(&self) -> f64 {
        self.speed.last_value().unwrap_or(0.0)
    }

    pub fn flow(&self) -> f64 {
        self.speed() / 100.0 * self.config.max_flow
    }

    pub fn pressure(&self) -> f64 {
        self.config.suction_pressure + self.speed() / 100.0 * self.config.delta_p
    }

    pub fn amperage(&self) -> f64 {
        self.speed() / 100.0 * self.config.max_amperage
    }
}

impl Equipment for Fan {
    fn name(&self) -> &str {
        self.device.name()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn refresh(&mut self) -> EquipmentResult<()> {
        self.device.update();
        let command = if self.device.status() {
            self.modulation.resolve_modulation()?
        } else {
            0.0
        };
        self.speed.set_command(command)?;
        self.speed.output()?;
        Ok(())
    }

    fn value(&self, key: &str) -> EquipmentResult<PointValue> {
        Ok(match key {
            "flow" => self.flow().into(),
            "pressure" => self.pressure().into(),
            "amperage" => self.amperage().into(),
            "status" => self.status().into(),
            _ => return Err(EquipmentError::unknown_reading(self.name(), key)),
        })
    }

    fn reading_names(&self) -> Vec<String> {
        Self::READINGS.iter().map(|s| s.to_string()).collect()
    }

    fn start(&mut self) -> EquipmentResult<()> {
        self.device.start();
        self.refresh()
    }

    fn stop(&mut self) -> EquipmentResult<()> {
        self.device.stop();
        self.refresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::{ManualClock, SimPoint};

    fn quiet() -> FanConfig {
        FanConfig {
            random_error: None,
            ..FanConfig::default()
        }
    }

    #[test]
    fn stopped_fan_reads_suction_only() {
        let clock = ManualClock::new(0.0);
        let mut fan = Fan::new("F_1", "", FanConfig { suction_pressure: 20.0, ..quiet() }, clock.handle()).unwrap();
        clock.advance(5.0);
        assert_eq!(fan.reading("flow").unwrap(), PointValue::Analog(0.0));
        assert_eq!(fan.reading("pressure").unwrap(), PointValue::Analog(20.0));
        assert_eq!(fan.reading("status").unwrap(), PointValue::Binary(false));
    }

    #[test]
    fn spins_up_to_full_speed() {
        let clock = ManualClock::new(0.0);
        let mut fan = Fan::new("F_1", "supply", quiet(), clock.handle()).unwrap();
        fan.start().unwrap();
        assert_eq!(fan.flow(), 0.0);
        clock.advance(2.0);
        fan.refresh().unwrap();
        assert!(fan.flow() > 1000.0 && fan.flow() < 2000.0);
        clock.advance(20.0);
        fan.refresh().unwrap();
        assert_eq!(fan.flow(), 2000.0);
        assert_eq!(fan.pressure(), 150.0);
        assert_eq!(fan.amperage(), 1.0);
    }

    #[test]
    fn binary_modulation_point_counts_as_full_speed() {
        let clock = ManualClock::new(0.0);
        let point = SimPoint::shared("FAN-CMD", true);
        let mut fan = Fan::new("F_1", "", quiet(), clock.handle()).unwrap();
        fan.set_modulation(InputSource::point(point.clone())).unwrap();
        fan.start().unwrap();
        clock.advance(30.0);
        fan.refresh().unwrap();
        assert_eq!(fan.speed(), 100.0);

        point.set(false);
        fan.refresh().unwrap();
        clock.advance(30.0);
        fan.refresh().unwrap();
        assert_eq!(fan.speed(), 0.0);
    }

    #[test]
    fn unknown_reading() {
        let clock = ManualClock::new(0.0);
        let fan = Fan::new("F_1", "", quiet(), clock.handle()).unwrap();
        assert!(matches!(
            fan.value("torque"),
            Err(EquipmentError::UnknownReading { .. })
        ));
    }
}
