//! Direct-expansion cooling stage.

use serde::{Deserialize, Serialize};

use ps_core::{ClockRef, PointValue};
use ps_transient::{InputSource, System, TransientConfig, TransientElement, ValueCommandElement};

use crate::error::{EquipmentError, EquipmentResult};
use crate::traits::Equipment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DxCoolingConfig {
    /// Stage command: 0–100 %, or a binary enable read as 0/100.
    pub modulation: f64,
    pub entering_temp: f64,
    pub delta_t: f64,
    pub min_temperature: f64,
    pub max_temperature: Option<f64>,
    pub tau: f64,
}

impl Default for DxCoolingConfig {
    fn default() -> Self {
        Self {
            modulation: 100.0,
            entering_temp: 0.0,
            delta_t: 7.0,
            min_temperature: 0.0,
            max_temperature: None,
            tau: 10.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DxCoolingStage {
    name: String,
    description: String,
    config: DxCoolingConfig,
    modulation: InputSource,
    entering_temp: InputSource,
    temperature: TransientElement,
}

impl DxCoolingStage {
    pub const READINGS: [&'static str; 1] = ["leaving_temp"];

    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        config: DxCoolingConfig,
        clock: ClockRef,
    ) -> EquipmentResult<Self> {
        let name = name.into();
        let mut transient = TransientConfig::new(config.delta_t, config.tau)
            .with_min_output(config.min_temperature)
            .decreasing();
        transient.max_output = config.max_temperature;
        let temperature = TransientElement::new(
            format!("{name} leaving temp"),
            ValueCommandElement::new(config.entering_temp, 0.0),
            transient,
            clock,
        )?;

        Ok(Self {
            name,
            description: description.into(),
            modulation: config.modulation.into(),
            entering_temp: config.entering_temp.into(),
            config,
            temperature,
        })
    }

    pub fn config(&self) -> &DxCoolingConfig {
        &self.config
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
}

impl Equipment for DxCoolingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn refresh(&mut self) -> EquipmentResult<()> {
        let modulation = self.modulation.resolve_modulation()?;
        self.temperature.set_value(self.entering_temp.resolve()?);
        self.temperature.set_command(modulation.max(0.0))?;
        self.temperature.output()?;
        Ok(())
    }

    fn value(&self, key: &str) -> EquipmentResult<PointValue> {
        match key {
            "leaving_temp" => Ok(self.leaving_temp().into()),
            _ => Err(EquipmentError::unknown_reading(&self.name, key)),
        }
    }

    fn reading_names(&self) -> Vec<String> {
        Self::READINGS.iter().map(|s| s.to_string()).collect()
    }
}
