//! Project validation logic.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::schema::{EquipmentDef, EquipmentKindDef, Project};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }
    if project.equipment.is_empty() {
        warn!(project = %project.name, "project defines no equipment");
    }

    let mut kinds = HashMap::new();
    for equipment in &project.equipment {
        if equipment.id.is_empty() {
            return Err(invalid(&equipment.id, "id", "", "must not be empty"));
        }
        if kinds.insert(equipment.id.as_str(), &equipment.kind).is_some() {
            return Err(ValidationError::DuplicateId {
                id: equipment.id.clone(),
                context: "equipment".to_string(),
            });
        }
        validate_kind(equipment)?;
        validate_outputs(equipment)?;
    }

    let mut grouped = HashSet::new();
    for equipment in &project.equipment {
        let EquipmentKindDef::ParallelGroup { members } = &equipment.kind else {
            continue;
        };
        if members.is_empty() {
            warn!(group = %equipment.id, "parallel group has no members");
        }
        for member in members {
            match kinds.get(member.as_str()) {
                None => {
                    return Err(ValidationError::MissingReference {
                        id: member.clone(),
                        context: format!("group '{}' members", equipment.id),
                    });
                }
                Some(EquipmentKindDef::Fan(_) | EquipmentKindDef::Pump(_)) => {}
                Some(other) => {
                    return Err(invalid(
                        &equipment.id,
                        "members",
                        member,
                        &format!("a {} cannot be grouped", other.type_name()),
                    ));
                }
            }
            if !grouped.insert(member.as_str()) {
                return Err(ValidationError::DuplicateId {
                    id: member.clone(),
                    context: "group members".to_string(),
                });
            }
        }
    }

    let mut points = HashMap::new();
    for equipment in &project.equipment {
        for point in equipment.outputs.values() {
            if let Some(other) = points.insert(point.as_str(), equipment.id.as_str()) {
                warn!(point = %point, first = other, second = %equipment.id, "point written by more than one output");
            }
        }
    }

    Ok(())
}

fn validate_kind(equipment: &EquipmentDef) -> Result<(), ValidationError> {
    let id = &equipment.id;
    match &equipment.kind {
        EquipmentKindDef::Fan(c) | EquipmentKindDef::Pump(c) => {
            positive(id, "tau", c.tau)?;
            non_negative(id, "max_flow", c.max_flow)?;
            non_negative(id, "max_amperage", c.max_amperage)?;
            noise(id, c.random_error)?;
        }
        EquipmentKindDef::Chiller(c) => {
            positive(id, "chwlt_tau", c.chwlt_tau)?;
            positive(id, "cwlt_tau", c.cwlt_tau)?;
            noise(id, c.random_error)?;
            if c.setpoint >= c.neutral_temp {
                warn!(equipment = %id, setpoint = c.setpoint, neutral = c.neutral_temp, "chiller setpoint is not below its neutral temperature");
            }
        }
        EquipmentKindDef::Valve(c) => {
            positive(id, "tau", c.tau)?;
            non_negative(id, "max_flow", c.max_flow)?;
        }
        EquipmentKindDef::MixedAirDampers(c) => {
            positive(id, "tau", c.tau)?;
            if !(0.0..=100.0).contains(&c.damper_command) {
                return Err(invalid(
                    id,
                    "damper_command",
                    &c.damper_command.to_string(),
                    "must be within 0..=100",
                ));
            }
        }
        EquipmentKindDef::DxCoolingStage(c) => positive(id, "tau", c.tau)?,
        EquipmentKindDef::Tank(c) => {
            if c.number_of_switches == 0 || c.number_of_switches > 100 {
                return Err(invalid(
                    id,
                    "number_of_switches",
                    &c.number_of_switches.to_string(),
                    "must be within 1..=100",
                ));
            }
            if let Some(tau) = c.fill_tau {
                positive(id, "fill_tau", tau)?;
            }
        }
        EquipmentKindDef::ParallelGroup { .. } => {}
    }
    Ok(())
}

fn validate_outputs(equipment: &EquipmentDef) -> Result<(), ValidationError> {
    let readings = equipment.kind.reading_names();
    for (reading, point) in &equipment.outputs {
        if !readings.contains(reading) {
            return Err(ValidationError::MissingReference {
                id: reading.clone(),
                context: format!("'{}' outputs", equipment.id),
            });
        }
        if point.is_empty() {
            return Err(invalid(&equipment.id, reading, "", "point name must not be empty"));
        }
    }
    Ok(())
}

fn invalid(id: &str, field: &str, value: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: format!("{id}.{field}"),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(id: &str, field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(id, field, &v.to_string(), "must be positive"))
    }
}

fn non_negative(id: &str, field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(id, field, &v.to_string(), "must be non-negative"))
    }
}

fn noise(id: &str, random_error: Option<f64>) -> Result<(), ValidationError> {
    match random_error {
        Some(v) => non_negative(id, "random_error", v),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_equipment::{FanConfig, TankConfig};
    use std::collections::BTreeMap;

    fn def(id: &str, kind: EquipmentKindDef) -> EquipmentDef {
        EquipmentDef {
            id: id.to_string(),
            description: String::new(),
            kind,
            outputs: BTreeMap::new(),
        }
    }

    fn project(equipment: Vec<EquipmentDef>) -> Project {
        Project {
            version: LATEST_VERSION,
            name: "test".to_string(),
            equipment,
        }
    }

    #[test]
    fn duplicate_ids() {
        let p = project(vec![
            def("P1", EquipmentKindDef::Pump(FanConfig::default())),
            def("P1", EquipmentKindDef::Pump(FanConfig::default())),
        ]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn group_members_must_be_fans() {
        let p = project(vec![
            def("T1", EquipmentKindDef::Tank(TankConfig::default())),
            def(
                "G",
                EquipmentKindDef::ParallelGroup {
                    members: vec!["T1".to_string()],
                },
            ),
        ]);
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn outputs_must_name_readings() {
        let mut pump = def("P1", EquipmentKindDef::Pump(FanConfig::default()));
        pump.outputs.insert("torque".to_string(), "P1-TQ".to_string());
        assert!(matches!(
            validate_project(&project(vec![pump])),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn tank_switch_outputs() {
        let mut tank = def(
            "T1",
            EquipmentKindDef::Tank(TankConfig {
                number_of_switches: 2,
                ..TankConfig::default()
            }),
        );
        tank.outputs.insert("switch_1".to_string(), "LS-1".to_string());
        validate_project(&project(vec![tank.clone()])).unwrap();
        tank.outputs.insert("switch_2".to_string(), "LS-2".to_string());
        assert!(validate_project(&project(vec![tank])).is_err());
    }

    #[test]
    fn unsupported_version() {
        let mut p = project(vec![]);
        p.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }
}
