//! Tank with proximity level switches.
//!
//! Switch levels are spaced `floor(100 / n)` apart starting at 0 (the last
//! spacing may land at or just below 100). The level is snapped to the
//! nearest one, at index `k`, and switch `i` is on iff `i < k`.

use serde::{Deserialize, Serialize};

use ps_core::{ClockRef, PointValue, Tolerances};
use ps_transient::{InputSource, System, TransientConfig, TransientElement};

use crate::error::{EquipmentError, EquipmentResult};
use crate::traits::Equipment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankConfig {
    pub number_of_switches: usize,
    /// Level in %.
    pub level: f64,
    /// Fill/drain lag. `None` makes the level instantaneous.
    pub fill_tau: Option<f64>,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            number_of_switches: 5,
            level: 0.0,
            fill_tau: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tank {
    name: String,
    description: String,
    config: TankConfig,
    level: InputSource,
    fill: Option<TransientElement>,
    current_level: f64,
}

impl Tank {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        config: TankConfig,
        clock: ClockRef,
    ) -> EquipmentResult<Self> {
        if config.number_of_switches == 0 || config.number_of_switches > 100 {
            return Err(EquipmentError::invalid(
                "number_of_switches must be between 1 and 100",
            ));
        }
        let name = name.into();
        let fill = config
            .fill_tau
            .map(|tau| {
                TransientElement::new(
                    format!("{name} level"),
                    InputSource::from(config.level),
                    TransientConfig::new(0.0, tau)
                        .with_min_output(0.0)
                        .with_max_output(100.0)
                        .with_change_tolerance(Tolerances::VALUE_TRACKING),
                    clock,
                )
            })
            .transpose()?;

        Ok(Self {
            name,
            description: description.into(),
            level: config.level.into(),
            current_level: if fill.is_some() { 0.0 } else { config.level },
            config,
            fill,
        })
    }

    pub fn config(&self) -> &TankConfig {
        &self.config
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn number_of_switches(&self) -> usize {
        self.config.number_of_switches
    }

    pub fn set_level(&mut self, level: impl Into<InputSource>) -> EquipmentResult<()> {
        self.level = level.into();
        self.refresh()
    }

    /// Level in %, as of the last refresh.
    pub fn level(&self) -> f64 {
        self.current_level
    }

    /// State of every proximity switch, lowest first.
    pub fn switches(&self) -> Vec<bool> {
        let index = nearest_level_index(self.current_level, self.config.number_of_switches);
        (0..self.config.number_of_switches).map(|i| i < index).collect()
    }

    pub fn switch(&self, i: usize) -> EquipmentResult<bool> {
        self.switches()
            .get(i)
            .copied()
            .ok_or_else(|| EquipmentError::unknown_reading(&self.name, &format!("switch_{i}")))
    }
}

/// Index of the switch level closest to `level`. Ties go to the lower one.
fn nearest_level_index(level: f64, switches: usize) -> usize {
    let step = 100 / switches;
    (0..=100u32)
        .step_by(step)
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, mark)| {
            let distance = (f64::from(mark) - level).abs();
            if distance < best.1 { (i, distance) } else { best }
        })
        .0
}

impl Equipment for Tank {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn refresh(&mut self) -> EquipmentResult<()> {
        let target = self.level.resolve()?;
        self.current_level = match self.fill.as_mut() {
            Some(fill) => {
                fill.set_value(target);
                fill.output()?
            }
            None => target,
        };
        Ok(())
    }

    fn value(&self, key: &str) -> EquipmentResult<PointValue> {
        if key == "level" {
            return Ok(self.current_level.into());
        }
        key.strip_prefix("switch_")
            .and_then(|i| i.parse::<usize>().ok())
            .ok_or_else(|| EquipmentError::unknown_reading(&self.name, key))
            .and_then(|i| self.switch(i))
            .map(PointValue::from)
    }

    fn reading_names(&self) -> Vec<String> {
        std::iter::once("level".to_string())
            .chain((0..self.config.number_of_switches).map(|i| format!("switch_{i}")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_core::ManualClock;

    fn tank(switches: usize, clock: &ManualClock) -> Tank {
        let config = TankConfig {
            number_of_switches: switches,
            ..TankConfig::default()
        };
        Tank::new("MYTANK", "Bassin 1", config, clock.handle()).unwrap()
    }

    #[test]
    fn empty_tank_has_no_switch_on() {
        let clock = ManualClock::new(0.0);
        let mut t = tank(7, &clock);
        t.refresh().unwrap();
        assert_eq!(t.switches(), vec![false; 7]);
    }

    #[test]
    fn nearest_index() {
        assert_eq!(nearest_level_index(50.0, 7), 4);
        assert_eq!(nearest_level_index(100.0, 7), 7);
        assert_eq!(nearest_level_index(0.0, 7), 0);
        assert_eq!(nearest_level_index(7.0, 7), 0);
        assert_eq!(nearest_level_index(100.0, 5), 5);
    }

    #[test]
    fn readings_by_name() {
        let clock = ManualClock::new(0.0);
        let mut t = tank(3, &clock);
        t.set_level(70.0).unwrap();
        assert_eq!(t.value("switch_1").unwrap(), PointValue::Binary(true));
        assert_eq!(t.value("switch_2").unwrap(), PointValue::Binary(false));
        assert_eq!(t.value("level").unwrap(), PointValue::Analog(70.0));
        assert!(matches!(
            t.value("switch_3"),
            Err(EquipmentError::UnknownReading { .. })
        ));
        assert!(t.value("switch_x").is_err());
        assert_eq!(t.reading_names().len(), 4);
    }

    #[test]
    fn rejects_zero_switches() {
        let clock = ManualClock::new(0.0);
        let config = TankConfig {
            number_of_switches: 0,
            ..TankConfig::default()
        };
        assert!(Tank::new("T", "", config, clock.handle()).is_err());
    }

    #[test]
    fn fill_lag() {
        let clock = ManualClock::new(0.0);
        let config = TankConfig {
            number_of_switches: 4,
            level: 100.0,
            fill_tau: Some(60.0),
        };
        let mut t = Tank::new("T", "", config, clock.handle()).unwrap();
        t.refresh().unwrap();
        assert_eq!(t.level(), 0.0);
        clock.advance(60.0);
        t.refresh().unwrap();
        assert!(t.level() > 50.0 && t.level() < 100.0);
        clock.advance(600.0);
        t.refresh().unwrap();
        assert_eq!(t.switches(), vec![true; 4]);
    }

    #[test]
    fn small_level_drop_is_lagged() {
        let clock = ManualClock::new(0.0);
        let config = TankConfig {
            number_of_switches: 4,
            level: 100.0,
            fill_tau: Some(60.0),
        };
        let mut t = Tank::new("T", "", config, clock.handle()).unwrap();
        t.refresh().unwrap();
        clock.advance(1_000.0);
        t.refresh().unwrap();
        assert_eq!(t.level(), 100.0);

        t.set_level(95.0).unwrap();
        assert_eq!(t.level(), 100.0);
        clock.advance(60.0);
        t.refresh().unwrap();
        assert!(t.level() > 95.0 && t.level() < 100.0);
        clock.advance(1_000.0);
        t.refresh().unwrap();
        assert_eq!(t.level(), 95.0);
    }
}
