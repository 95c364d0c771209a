//! Basic chiller approximation.
//!
//! Two transients: the chilled water leaving temperature drops from the
//! neutral temperature toward the setpoint, and the condenser water leaving
//! temperature rises. Entering temperatures are derived from how far the
//! chilled side has pulled down.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ps_core::{ClockRef, PointValue};
use ps_transient::{InputSource, System, TransientConfig, TransientElement, ValueCommandElement};

use crate::device::{OnOffDevice, Transition};
use crate::error::{EquipmentError, EquipmentResult};
use crate::traits::Equipment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChillerConfig {
    pub start_command: bool,
    /// Loop temperature with the chiller off.
    pub neutral_temp: f64,
    /// Chilled water leaving setpoint.
    pub setpoint: f64,
    pub modulation: f64,
    pub min_chwlt: f64,
    pub chwlt_tau: f64,
    /// Condenser water rise at full load.
    pub cwlt_delta: f64,
    pub max_cwlt: f64,
    pub cwlt_tau: f64,
    /// Entering/leaving difference on both loops at full load.
    pub loop_delta_t: f64,
    pub random_error: Option<f64>,
}

impl Default for ChillerConfig {
    fn default() -> Self {
        Self {
            start_command: false,
            neutral_temp: 20.0,
            setpoint: 6.0,
            modulation: 100.0,
            min_chwlt: 5.0,
            chwlt_tau: 60.0,
            cwlt_delta: 20.0,
            max_cwlt: 40.0,
            cwlt_tau: 30.0,
            loop_delta_t: 5.0,
            random_error: Some(0.1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chiller {
    device: OnOffDevice,
    description: String,
    config: ChillerConfig,
    neutral_temp: InputSource,
    setpoint: InputSource,
    modulation: InputSource,
    neutral: f64,
    chwlt: TransientElement,
    cwlt: TransientElement,
}

impl Chiller {
    pub const READINGS: [&'static str; 5] = ["chwlt", "cwlt", "chwet", "cwet", "status"];

    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        config: ChillerConfig,
        clock: ClockRef,
    ) -> EquipmentResult<Self> {
        let name = name.into();
        let mut chwlt_config =
            TransientConfig::new(config.neutral_temp - config.setpoint, config.chwlt_tau)
                .with_min_output(config.min_chwlt)
                .decreasing();
        chwlt_config.random_error = config.random_error;
        let mut cwlt_config = TransientConfig::new(config.cwlt_delta, config.cwlt_tau)
            .with_max_output(config.max_cwlt);
        cwlt_config.random_error = config.random_error;

        let inlet = || ValueCommandElement::new(config.neutral_temp, 0.0);
        let chwlt = TransientElement::new(
            format!("{name} chilled water leaving temp"),
            inlet(),
            chwlt_config,
            clock.clone(),
        )?;
        let cwlt = TransientElement::new(
            format!("{name} condenser water leaving temp"),
            inlet(),
            cwlt_config,
            clock,
        )?;

        Ok(Self {
            device: OnOffDevice::new(name, config.start_command),
            description: description.into(),
            neutral_temp: config.neutral_temp.into(),
            setpoint: config.setpoint.into(),
            modulation: config.modulation.into(),
            neutral: config.neutral_temp,
            config,
            chwlt,
            cwlt,
        })
    }

    pub fn config(&self) -> &ChillerConfig {
        &self.config
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.device.set_name(name);
    }

    pub fn set_setpoint(&mut self, setpoint: impl Into<InputSource>) -> EquipmentResult<()> {
        self.setpoint = setpoint.into();
        self.refresh()
    }

    pub fn set_neutral_temp(&mut self, temp: impl Into<InputSource>) -> EquipmentResult<()> {
        self.neutral_temp = temp.into();
        self.refresh()
    }

    pub fn set_modulation(&mut self, modulation: impl Into<InputSource>) -> EquipmentResult<()> {
        self.modulation = modulation.into();
        self.refresh()
    }

    pub fn status(&self) -> bool {
        self.device.status()
    }

    pub fn chwlt(&self) -> f64 {
        self.chwlt.last_value().unwrap_or(self.neutral)
    }

    pub fn cwlt(&self) -> f64 {
        self.cwlt.last_value().unwrap_or(self.neutral)
    }

    /// How far the chilled side has pulled down, in [0, 1].
    pub fn load_fraction(&self) -> f64 {
        let span = self.chwlt.delta_max();
        if span <= 0.0 {
            return 0.0;
        }
        ((self.neutral - self.chwlt()) / span).clamp(0.0, 1.0)
    }

    pub fn chwet(&self) -> f64 {
        self.chwlt() + self.config.loop_delta_t * self.load_fraction()
    }

    pub fn cwet(&self) -> f64 {
        self.cwlt() - self.config.loop_delta_t * self.load_fraction()
    }
}

impl Equipment for Chiller {
    fn name(&self) -> &str {
        self.device.name()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn refresh(&mut self) -> EquipmentResult<()> {
        if let Some(Transition::Stopped) = self.device.update() {
            debug!(equipment = self.device.name(), "returning to neutral temperature");
        }
        self.neutral = self.neutral_temp.resolve()?;
        let setpoint = self.setpoint.resolve()?;
        let command = if self.device.status() {
            self.modulation.resolve_modulation()?
        } else {
            0.0
        };

        self.chwlt.set_value(self.neutral);
        self.chwlt.set_delta_max(self.neutral - setpoint)?;
        self.chwlt.set_command(command)?;
        self.cwlt.set_value(self.neutral);
        self.cwlt.set_command(command)?;

        self.chwlt.output()?;
        self.cwlt.output()?;
        Ok(())
    }

    fn value(&self, key: &str) -> EquipmentResult<PointValue> {
        Ok(match key {
            "chwlt" => self.chwlt().into(),
            "cwlt" => self.cwlt().into(),
            "chwet" => self.chwet().into(),
            "cwet" => self.cwet().into(),
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
    use ps_core::ManualClock;

    fn chiller(clock: &ManualClock) -> Chiller {
        let config = ChillerConfig {
            random_error: None,
            ..ChillerConfig::default()
        };
        Chiller::new("CH_1", "", config, clock.handle()).unwrap()
    }

    #[test]
    fn idle_chiller_sits_at_neutral() {
        let clock = ManualClock::new(0.0);
        let mut ch = chiller(&clock);
        ch.refresh().unwrap();
        assert_eq!(ch.chwlt(), 20.0);
        assert_eq!(ch.cwlt(), 20.0);
        assert_eq!(ch.load_fraction(), 0.0);
        assert_eq!(ch.chwet(), 20.0);
    }

    #[test]
    fn pulls_down_to_setpoint() {
        let clock = ManualClock::new(0.0);
        let mut ch = chiller(&clock);
        ch.start().unwrap();
        clock.advance(60.0);
        ch.refresh().unwrap();
        assert!(ch.chwlt() < 20.0 && ch.chwlt() > 6.0);
        assert!(ch.cwlt() > 20.0 && ch.cwlt() < 40.0);

        clock.advance(600.0);
        ch.refresh().unwrap();
        assert_eq!(ch.chwlt(), 6.0);
        assert_eq!(ch.cwlt(), 40.0);
        assert_eq!(ch.load_fraction(), 1.0);
        assert_eq!(ch.chwet(), 11.0);
        assert_eq!(ch.cwet(), 35.0);
    }

    #[test]
    fn stop_returns_to_neutral() {
        let clock = ManualClock::new(0.0);
        let mut ch = chiller(&clock);
        ch.start().unwrap();
        clock.advance(600.0);
        ch.refresh().unwrap();
        ch.stop().unwrap();
        clock.advance(600.0);
        ch.refresh().unwrap();
        assert_eq!(ch.chwlt(), 20.0);
        assert_eq!(ch.cwlt(), 20.0);
    }

    #[test]
    fn setpoint_change_is_lagged() {
        let clock = ManualClock::new(0.0);
        let mut ch = chiller(&clock);
        ch.start().unwrap();
        clock.advance(1_000.0);
        ch.refresh().unwrap();
        assert_eq!(ch.chwlt(), 6.0);

        ch.set_setpoint(8.0).unwrap();
        assert_eq!(ch.chwlt(), 6.0);
        clock.advance(60.0);
        ch.refresh().unwrap();
        let mid = ch.chwlt();
        assert!((mid - (6.0 + 2.0 * (1.0 - (-1.0_f64).exp()))).abs() < 1e-9);
        clock.advance(1_000.0);
        ch.refresh().unwrap();
        assert_eq!(ch.chwlt(), 8.0);
    }

    #[test]
    fn lower_setpoint_is_floored() {
        let clock = ManualClock::new(0.0);
        let mut ch = chiller(&clock);
        ch.start().unwrap();
        ch.set_setpoint(2.0).unwrap();
        clock.advance(1_000.0);
        ch.refresh().unwrap();
        assert_eq!(ch.chwlt(), 5.0);
    }
}
