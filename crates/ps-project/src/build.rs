//! Turning a validated project into live equipment.

use std::rc::Rc;

use ps_core::{ClockRef, PointSink, SimPoint};
use ps_equipment::{
    Chiller, DxCoolingStage, Equipment, EquipmentError, EquipmentKind, Fan, MixedAirDampers,
    Registry, Tank, Valve,
};
use tracing::debug;

use crate::ProjectResult;
use crate::schema::{EquipmentKindDef, Project};

/// One equipment reading mirrored into a point.
#[derive(Debug, Clone)]
pub struct OutputBinding {
    pub equipment: String,
    pub reading: String,
    pub point: Rc<SimPoint>,
}

/// The equipment of a project plus the points its outputs write to.
#[derive(Debug)]
pub struct Plant {
    pub name: String,
    pub registry: Registry,
    pub outputs: Vec<OutputBinding>,
}

impl Plant {
    /// Refresh all equipment and write every bound reading into its point.
    pub fn publish(&mut self) -> ProjectResult<()> {
        self.registry.refresh_all()?;
        for binding in &self.outputs {
            let equipment = self.registry.get(&binding.equipment).ok_or_else(|| {
                EquipmentError::UnknownEquipment {
                    name: binding.equipment.clone(),
                }
            })?;
            let value = equipment.value(&binding.reading)?;
            binding.point.write(value).map_err(EquipmentError::from)?;
        }
        Ok(())
    }

    pub fn point(&self, name: &str) -> Option<&Rc<SimPoint>> {
        self.outputs
            .iter()
            .map(|b| &b.point)
            .find(|p| p.name() == name)
    }
}

/// Build every piece of equipment of `project` on `clock`.
///
/// Groups are built last so that their members already exist.
pub fn build_plant(project: &Project, clock: &ClockRef) -> ProjectResult<Plant> {
    let mut registry = Registry::new();

    for def in &project.equipment {
        let (id, desc, clock) = (def.id.as_str(), def.description.as_str(), clock.clone());
        let equipment: EquipmentKind = match &def.kind {
            EquipmentKindDef::Fan(c) => Fan::new(id, desc, c.clone(), clock)?.into(),
            EquipmentKindDef::Pump(c) => EquipmentKind::Pump(Fan::new(id, desc, c.clone(), clock)?),
            EquipmentKindDef::Chiller(c) => Chiller::new(id, desc, c.clone(), clock)?.into(),
            EquipmentKindDef::Valve(c) => Valve::new(id, desc, c.clone(), clock)?.into(),
            EquipmentKindDef::MixedAirDampers(c) => {
                MixedAirDampers::new(id, desc, c.clone(), clock)?.into()
            }
            EquipmentKindDef::DxCoolingStage(c) => {
                DxCoolingStage::new(id, desc, c.clone(), clock)?.into()
            }
            EquipmentKindDef::Tank(c) => Tank::new(id, desc, c.clone(), clock)?.into(),
            EquipmentKindDef::ParallelGroup { .. } => continue,
        };
        registry.insert(equipment)?;
    }

    for def in &project.equipment {
        if let EquipmentKindDef::ParallelGroup { members } = &def.kind {
            let members: Vec<&str> = members.iter().map(String::as_str).collect();
            registry.group(def.id.as_str(), def.description.as_str(), &members)?;
        }
    }

    let mut outputs = Vec::new();
    for def in &project.equipment {
        for (reading, point) in &def.outputs {
            outputs.push(OutputBinding {
                equipment: def.id.clone(),
                reading: reading.clone(),
                point: SimPoint::shared(point.as_str(), 0.0),
            });
        }
    }
    debug!(
        project = %project.name,
        equipment = registry.len(),
        outputs = outputs.len(),
        "plant built"
    );

    Ok(Plant {
        name: project.name.clone(),
        registry,
        outputs,
    })
}
