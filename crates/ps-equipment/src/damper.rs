//! Mixed-air dampers.
//!
//! The outdoor-air damper opens to `damper_command` %, the return-air damper
//! mirrors it at `100 − damper_command` %. The mixed air temperature and CO2
//! are flow-weighted averages of both streams, each lagged by a value-only
//! transient.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use ps_core::{ClockRef, PointValue, Tolerances};
use ps_transient::{
    InputSource, Mix, MixInputElement, System, TransientConfig, TransientElement, shared,
};

use crate::error::{EquipmentError, EquipmentResult};
use crate::traits::Equipment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamperConfig {
    pub damper_command: f64,
    pub outdoor_air_temp: f64,
    pub return_air_temp: f64,
    pub outdoor_air_co2: f64,
    pub return_air_co2: f64,
    pub tau: f64,
}

impl Default for DamperConfig {
    fn default() -> Self {
        Self {
            damper_command: 0.0,
            outdoor_air_temp: 0.0,
            return_air_temp: 21.0,
            outdoor_air_co2: 400.0,
            return_air_co2: 500.0,
            tau: 10.0,
        }
    }
}

/// Live inputs of the damper section.
#[derive(Debug, Clone)]
struct Streams {
    damper_command: InputSource,
    outdoor_air_temp: InputSource,
    return_air_temp: InputSource,
    outdoor_air_co2: InputSource,
    return_air_co2: InputSource,
}

#[derive(Debug)]
pub struct MixedAirDampers {
    name: String,
    description: String,
    config: DamperConfig,
    streams: Streams,
    temp_mix: Rc<RefCell<Mix>>,
    co2_mix: Rc<RefCell<Mix>>,
    temperature: TransientElement,
    co2: TransientElement,
}

impl MixedAirDampers {
    pub const READINGS: [&'static str; 2] = ["mixed_air_temp", "mixed_air_co2"];

    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        config: DamperConfig,
        clock: ClockRef,
    ) -> EquipmentResult<Self> {
        let name = name.into();
        let outdoor = config.damper_command;
        let ret = 100.0 - outdoor;

        let temp_mix = shared(Mix::new(
            format!("{name} temp mix"),
            MixInputElement::new(config.outdoor_air_temp, outdoor),
            MixInputElement::new(config.return_air_temp, ret),
        ));
        let co2_mix = shared(Mix::new(
            format!("{name} co2 mix"),
            MixInputElement::new(config.outdoor_air_co2, outdoor),
            MixInputElement::new(config.return_air_co2, ret),
        ));

        let lag =
            TransientConfig::new(0.0, config.tau).with_change_tolerance(Tolerances::VALUE_TRACKING);
        let temperature = TransientElement::new(
            format!("{name} mixed air temp"),
            InputSource::nested(temp_mix.clone()),
            lag.clone(),
            clock.clone(),
        )?;
        let co2 = TransientElement::new(
            format!("{name} mixed air co2"),
            InputSource::nested(co2_mix.clone()),
            lag,
            clock,
        )?;

        Ok(Self {
            name,
            description: description.into(),
            streams: Streams {
                damper_command: config.damper_command.into(),
                outdoor_air_temp: config.outdoor_air_temp.into(),
                return_air_temp: config.return_air_temp.into(),
                outdoor_air_co2: config.outdoor_air_co2.into(),
                return_air_co2: config.return_air_co2.into(),
            },
            config,
            temp_mix,
            co2_mix,
            temperature,
            co2,
        })
    }

    pub fn config(&self) -> &DamperConfig {
        &self.config
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_damper_command(&mut self, command: impl Into<InputSource>) -> EquipmentResult<()> {
        self.streams.damper_command = command.into();
        self.refresh()
    }

    pub fn set_outdoor_air_temp(&mut self, temp: impl Into<InputSource>) -> EquipmentResult<()> {
        self.streams.outdoor_air_temp = temp.into();
        self.refresh()
    }

    pub fn set_return_air_temp(&mut self, temp: impl Into<InputSource>) -> EquipmentResult<()> {
        self.streams.return_air_temp = temp.into();
        self.refresh()
    }

    pub fn set_outdoor_air_co2(&mut self, co2: impl Into<InputSource>) -> EquipmentResult<()> {
        self.streams.outdoor_air_co2 = co2.into();
        self.refresh()
    }

    pub fn set_return_air_co2(&mut self, co2: impl Into<InputSource>) -> EquipmentResult<()> {
        self.streams.return_air_co2 = co2.into();
        self.refresh()
    }

    pub fn mixed_air_temp(&self) -> f64 {
        self.temperature.last_value().unwrap_or(0.0)
    }

    pub fn mixed_air_co2(&self) -> f64 {
        self.co2.last_value().unwrap_or(0.0)
    }

    /// Instantaneous mix, before the lag.
    pub fn target_temp(&self) -> Option<f64> {
        self.temp_mix.borrow().last_value()
    }
}

impl Equipment for MixedAirDampers {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn refresh(&mut self) -> EquipmentResult<()> {
        let outdoor = self.streams.damper_command.resolve_modulation()?;
        let ret = 100.0 - outdoor;

        let oat = self.streams.outdoor_air_temp.resolve()?;
        let rat = self.streams.return_air_temp.resolve()?;
        let oa_co2 = self.streams.outdoor_air_co2.resolve()?;
        let ra_co2 = self.streams.return_air_co2.resolve()?;
        {
            let mut mix = self.temp_mix.borrow_mut();
            *mix.first_mut() = MixInputElement::new(oat, outdoor);
            *mix.second_mut() = MixInputElement::new(rat, ret);
        }
        {
            let mut mix = self.co2_mix.borrow_mut();
            *mix.first_mut() = MixInputElement::new(oa_co2, outdoor);
            *mix.second_mut() = MixInputElement::new(ra_co2, ret);
        }

        self.temperature.output()?;
        self.co2.output()?;
        Ok(())
    }

    fn value(&self, key: &str) -> EquipmentResult<PointValue> {
        match key {
            "mixed_air_temp" => Ok(self.mixed_air_temp().into()),
            "mixed_air_co2" => Ok(self.mixed_air_co2().into()),
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
    fn closed_damper_lags_toward_return_air() {
        let clock = ManualClock::new(0.0);
        let mut d =
            MixedAirDampers::new("MAD_1", "", DamperConfig::default(), clock.handle()).unwrap();
        d.refresh().unwrap();
        assert_eq!(d.target_temp(), Some(21.0));
        assert_eq!(d.mixed_air_temp(), 0.0);
        clock.advance(200.0);
        d.refresh().unwrap();
        assert_eq!(d.mixed_air_temp(), 21.0);
        assert_eq!(d.mixed_air_co2(), 500.0);
    }

    #[test]
    fn opening_blends_outdoor_air() {
        let clock = ManualClock::new(0.0);
        let config = DamperConfig {
            outdoor_air_temp: -20.0,
            ..DamperConfig::default()
        };
        let mut d = MixedAirDampers::new("MAD_1", "", config, clock.handle()).unwrap();
        d.set_damper_command(10.0).unwrap();
        assert!((d.target_temp().unwrap() - 16.9).abs() < 1e-9);
        clock.advance(200.0);
        d.refresh().unwrap();
        assert!((d.mixed_air_temp() - 16.9).abs() < 1e-9);
        assert!((d.mixed_air_co2() - 490.0).abs() < 1e-9);
    }

    #[test]
    fn small_damper_move_is_lagged() {
        let clock = ManualClock::new(0.0);
        let config = DamperConfig {
            outdoor_air_temp: -20.0,
            ..DamperConfig::default()
        };
        let mut d = MixedAirDampers::new("MAD_1", "", config, clock.handle()).unwrap();
        d.refresh().unwrap();
        clock.advance(200.0);
        d.refresh().unwrap();
        assert_eq!(d.mixed_air_temp(), 21.0);

        d.set_damper_command(5.0).unwrap();
        assert!((d.target_temp().unwrap() - 18.95).abs() < 1e-9);
        assert_eq!(d.mixed_air_temp(), 21.0);
        clock.advance(10.0);
        d.refresh().unwrap();
        let mid = d.mixed_air_temp();
        assert!(mid > 18.95 && mid < 21.0, "mid-transient mixed air {mid}");
        clock.advance(200.0);
        d.refresh().unwrap();
        assert!((d.mixed_air_temp() - 18.95).abs() < 1e-9);
    }
}
