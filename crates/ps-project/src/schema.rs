//! Project schema definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ps_equipment::{ChillerConfig, DamperConfig, DxCoolingConfig, FanConfig, TankConfig, ValveConfig};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub equipment: Vec<EquipmentDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EquipmentDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub kind: EquipmentKindDef,
    /// Reading name → point name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum EquipmentKindDef {
    Fan(FanConfig),
    Pump(FanConfig),
    ParallelGroup {
        members: Vec<String>,
    },
    Chiller(ChillerConfig),
    Valve(ValveConfig),
    MixedAirDampers(DamperConfig),
    DxCoolingStage(DxCoolingConfig),
    Tank(TankConfig),
}

impl EquipmentKindDef {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Fan(_) => "Fan",
            Self::Pump(_) => "Pump",
            Self::ParallelGroup { .. } => "ParallelGroup",
            Self::Chiller(_) => "Chiller",
            Self::Valve(_) => "Valve",
            Self::MixedAirDampers(_) => "MixedAirDampers",
            Self::DxCoolingStage(_) => "DxCoolingStage",
            Self::Tank(_) => "Tank",
        }
    }

    /// Reading names the built equipment will answer to.
    pub fn reading_names(&self) -> Vec<String> {
        use ps_equipment::{
            Chiller, DxCoolingStage, Fan, MixedAirDampers, ParallelGroup, Valve,
        };

        let fixed: &[&str] = match self {
            Self::Fan(_) | Self::Pump(_) => &Fan::READINGS,
            Self::ParallelGroup { .. } => &ParallelGroup::READINGS,
            Self::Chiller(_) => &Chiller::READINGS,
            Self::Valve(_) => &Valve::READINGS,
            Self::MixedAirDampers(_) => &MixedAirDampers::READINGS,
            Self::DxCoolingStage(_) => &DxCoolingStage::READINGS,
            Self::Tank(tank) => {
                return std::iter::once("level".to_string())
                    .chain((0..tank.number_of_switches).map(|i| format!("switch_{i}")))
                    .collect();
            }
        };
        fixed.iter().map(|s| s.to_string()).collect()
    }
}
