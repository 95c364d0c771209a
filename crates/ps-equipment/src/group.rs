//! Fans or pumps running in parallel.

use ps_core::PointValue;

use crate::error::{EquipmentError, EquipmentResult};
use crate::fan::Fan;
use crate::traits::Equipment;

/// Members share one header: flows add up, and so do their pressure
/// contributions.
#[derive(Debug, Clone)]
pub struct ParallelGroup {
    name: String,
    description: String,
    members: Vec<Fan>,
}

impl ParallelGroup {
    pub const READINGS: [&'static str; 2] = ["flow", "pressure"];

    pub fn new(name: impl Into<String>, description: impl Into<String>, members: Vec<Fan>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            members,
        }
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn members(&self) -> &[Fan] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Fan> {
        self.members.iter().find(|m| m.name() == name)
    }

    pub fn member_mut(&mut self, name: &str) -> Option<&mut Fan> {
        self.members.iter_mut().find(|m| m.name() == name)
    }

    pub fn push(&mut self, member: Fan) {
        self.members.push(member);
    }

    pub fn start_member(&mut self, name: &str) -> EquipmentResult<()> {
        self.member_mut(name)
            .ok_or_else(|| EquipmentError::UnknownEquipment {
                name: name.to_string(),
            })?
            .start()
    }

    pub fn stop_member(&mut self, name: &str) -> EquipmentResult<()> {
        self.member_mut(name)
            .ok_or_else(|| EquipmentError::UnknownEquipment {
                name: name.to_string(),
            })?
            .stop()
    }

    pub fn flow(&self) -> f64 {
        self.members.iter().map(Fan::flow).sum()
    }

    pub fn pressure(&self) -> f64 {
        self.members.iter().map(Fan::pressure).sum()
    }
}

impl Equipment for ParallelGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn refresh(&mut self) -> EquipmentResult<()> {
        for member in &mut self.members {
            member.refresh()?;
        }
        Ok(())
    }

    fn value(&self, key: &str) -> EquipmentResult<PointValue> {
        match key {
            "flow" => Ok(self.flow().into()),
            "pressure" => Ok(self.pressure().into()),
            _ => Err(EquipmentError::unknown_reading(&self.name, key)),
        }
    }

    fn reading_names(&self) -> Vec<String> {
        Self::READINGS.iter().map(|s| s.to_string()).collect()
    }

    /// Start every member.
    fn start(&mut self) -> EquipmentResult<()> {
        for member in &mut self.members {
            member.start()?;
        }
        Ok(())
    }

    fn stop(&mut self) -> EquipmentResult<()> {
        for member in &mut self.members {
            member.stop()?;
        }
        Ok(())
    }
}
