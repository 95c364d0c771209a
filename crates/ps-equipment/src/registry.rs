//! Equipment registry owned by a simulation session.

use std::collections::BTreeMap;

use ps_core::PointValue;
use tracing::debug;

use crate::chiller::Chiller;
use crate::damper::MixedAirDampers;
use crate::dx_cooling::DxCoolingStage;
use crate::error::{EquipmentError, EquipmentResult};
use crate::fan::{Fan, Pump};
use crate::group::ParallelGroup;
use crate::tank::Tank;
use crate::traits::Equipment;
use crate::valve::Valve;

/// Any equipment the registry can hold.
#[derive(Debug)]
pub enum EquipmentKind {
    Fan(Fan),
    Pump(Pump),
    ParallelGroup(ParallelGroup),
    Chiller(Chiller),
    Valve(Valve),
    MixedAirDampers(MixedAirDampers),
    DxCoolingStage(DxCoolingStage),
    Tank(Tank),
}

macro_rules! dispatch {
    ($self:expr, $e:ident => $body:expr) => {
        match $self {
            EquipmentKind::Fan($e) => $body,
            EquipmentKind::Pump($e) => $body,
            EquipmentKind::ParallelGroup($e) => $body,
            EquipmentKind::Chiller($e) => $body,
            EquipmentKind::Valve($e) => $body,
            EquipmentKind::MixedAirDampers($e) => $body,
            EquipmentKind::DxCoolingStage($e) => $body,
            EquipmentKind::Tank($e) => $body,
        }
    };
}

impl EquipmentKind {
    /// Prefix used for generated names.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Fan(_) => "Fan",
            Self::Pump(_) => "Pump",
            Self::ParallelGroup(_) => "ParallelGroup",
            Self::Chiller(_) => "Chiller",
            Self::Valve(_) => "Valve",
            Self::MixedAirDampers(_) => "MixedAirDampers",
            Self::DxCoolingStage(_) => "DxCoolingStage",
            Self::Tank(_) => "Tank",
        }
    }

    fn set_name(&mut self, name: String) {
        dispatch!(self, e => e.set_name(name))
    }

    /// The fan or pump inside, if that is what this is.
    pub fn into_fan(self) -> Result<Fan, Self> {
        match self {
            Self::Fan(f) | Self::Pump(f) => Ok(f),
            other => Err(other),
        }
    }
}

impl Equipment for EquipmentKind {
    fn name(&self) -> &str {
        dispatch!(self, e => e.name())
    }

    fn description(&self) -> &str {
        dispatch!(self, e => e.description())
    }

    fn refresh(&mut self) -> EquipmentResult<()> {
        dispatch!(self, e => e.refresh())
    }

    fn value(&self, key: &str) -> EquipmentResult<PointValue> {
        dispatch!(self, e => e.value(key))
    }

    fn reading_names(&self) -> Vec<String> {
        dispatch!(self, e => e.reading_names())
    }

    fn start(&mut self) -> EquipmentResult<()> {
        dispatch!(self, e => e.start())
    }

    fn stop(&mut self) -> EquipmentResult<()> {
        dispatch!(self, e => e.stop())
    }
}

impl From<Fan> for EquipmentKind {
    fn from(f: Fan) -> Self {
        Self::Fan(f)
    }
}

impl From<ParallelGroup> for EquipmentKind {
    fn from(g: ParallelGroup) -> Self {
        Self::ParallelGroup(g)
    }
}

impl From<Chiller> for EquipmentKind {
    fn from(c: Chiller) -> Self {
        Self::Chiller(c)
    }
}

impl From<Valve> for EquipmentKind {
    fn from(v: Valve) -> Self {
        Self::Valve(v)
    }
}

impl From<MixedAirDampers> for EquipmentKind {
    fn from(d: MixedAirDampers) -> Self {
        Self::MixedAirDampers(d)
    }
}

impl From<DxCoolingStage> for EquipmentKind {
    fn from(d: DxCoolingStage) -> Self {
        Self::DxCoolingStage(d)
    }
}

impl From<Tank> for EquipmentKind {
    fn from(t: Tank) -> Self {
        Self::Tank(t)
    }
}

/// Named equipment, in insertion order.
#[derive(Debug, Default)]
pub struct Registry {
    equipment: Vec<EquipmentKind>,
    counters: BTreeMap<&'static str, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.equipment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equipment.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Next free `"{kind}_{n}"` name.
    pub fn next_name(&mut self, kind: &'static str) -> String {
        loop {
            let n = self.counters.entry(kind).or_insert(0);
            *n += 1;
            let name = format!("{kind}_{n}");
            if !self.contains(&name) {
                return name;
            }
        }
    }

    /// Add equipment. An empty name is replaced by a generated one.
    ///
    /// Returns the name the equipment is registered under.
    ///
    /// # Errors
    ///
    /// [`EquipmentError::DuplicateName`] if the name is taken.
    pub fn insert(&mut self, equipment: impl Into<EquipmentKind>) -> EquipmentResult<String> {
        let mut equipment = equipment.into();
        if equipment.name().is_empty() {
            let name = self.next_name(equipment.kind_name());
            equipment.set_name(name);
        }
        let name = equipment.name().to_string();
        if self.contains(&name) {
            return Err(EquipmentError::DuplicateName { name });
        }
        debug!(equipment = %name, kind = equipment.kind_name(), "registered");
        self.equipment.push(equipment);
        Ok(name)
    }

    pub fn get(&self, name: &str) -> Option<&EquipmentKind> {
        self.equipment.iter().find(|e| e.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut EquipmentKind> {
        self.equipment.iter_mut().find(|e| e.name() == name)
    }

    /// Like [`get_mut`](Self::get_mut), with an error for unknown names.
    pub fn require_mut(&mut self, name: &str) -> EquipmentResult<&mut EquipmentKind> {
        self.get_mut(name)
            .ok_or_else(|| EquipmentError::UnknownEquipment {
                name: name.to_string(),
            })
    }

    pub fn remove(&mut self, name: &str) -> Option<EquipmentKind> {
        let index = self.equipment.iter().position(|e| e.name() == name)?;
        Some(self.equipment.remove(index))
    }

    /// Move existing fans or pumps into a new [`ParallelGroup`].
    ///
    /// Nothing is moved unless every member exists, is a fan or pump, and is
    /// listed once.
    pub fn group(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        members: &[&str],
    ) -> EquipmentResult<String> {
        let name = name.into();
        if !name.is_empty() && self.contains(&name) {
            return Err(EquipmentError::DuplicateName { name });
        }
        for (i, member) in members.iter().enumerate() {
            if members[..i].contains(member) {
                return Err(EquipmentError::DuplicateName {
                    name: member.to_string(),
                });
            }
            match self.get(member) {
                Some(EquipmentKind::Fan(_) | EquipmentKind::Pump(_)) => {}
                Some(other) => {
                    return Err(EquipmentError::invalid(format!(
                        "'{member}' is a {}, only fans and pumps can be grouped",
                        other.kind_name()
                    )));
                }
                None => {
                    return Err(EquipmentError::UnknownEquipment {
                        name: member.to_string(),
                    });
                }
            }
        }

        let mut fans = Vec::with_capacity(members.len());
        for member in members {
            if let Some(Ok(fan)) = self.remove(member).map(EquipmentKind::into_fan) {
                fans.push(fan);
            }
        }
        self.insert(ParallelGroup::new(name, description, fans))
    }

    /// Refresh every piece of equipment, in insertion order.
    pub fn refresh_all(&mut self) -> EquipmentResult<()> {
        for equipment in &mut self.equipment {
            equipment.refresh()?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &EquipmentKind> {
        self.equipment.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EquipmentKind> {
        self.equipment.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.equipment.iter().map(|e| e.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fan::FanConfig;
    use crate::tank::TankConfig;
    use ps_core::ManualClock;

    fn fan(name: &str, clock: &ManualClock) -> Fan {
        Fan::new(name, "", FanConfig::default(), clock.handle()).unwrap()
    }

    #[test]
    fn generated_names_count_per_kind() {
        let clock = ManualClock::new(0.0);
        let mut reg = Registry::new();
        assert_eq!(reg.insert(fan("", &clock)).unwrap(), "Fan_1");
        assert_eq!(reg.insert(fan("", &clock)).unwrap(), "Fan_2");
        assert_eq!(
            reg.insert(EquipmentKind::Pump(fan("", &clock))).unwrap(),
            "Pump_1"
        );
        let tank = Tank::new("", "", TankConfig::default(), clock.handle()).unwrap();
        assert_eq!(reg.insert(tank).unwrap(), "Tank_1");
        assert_eq!(reg.len(), 4);
    }

    #[test]
    fn generated_names_skip_taken_ones() {
        let clock = ManualClock::new(0.0);
        let mut reg = Registry::new();
        reg.insert(fan("Fan_1", &clock)).unwrap();
        assert_eq!(reg.insert(fan("", &clock)).unwrap(), "Fan_2");
    }

    #[test]
    fn duplicates_are_rejected() {
        let clock = ManualClock::new(0.0);
        let mut reg = Registry::new();
        reg.insert(fan("SF", &clock)).unwrap();
        let err = reg.insert(fan("SF", &clock)).unwrap_err();
        assert_eq!(err, EquipmentError::DuplicateName { name: "SF".into() });
    }

    #[test]
    fn grouping_moves_members() {
        let clock = ManualClock::new(0.0);
        let mut reg = Registry::new();
        reg.insert(EquipmentKind::Pump(fan("P1", &clock))).unwrap();
        reg.insert(EquipmentKind::Pump(fan("P2", &clock))).unwrap();
        let tank = Tank::new("T1", "", TankConfig::default(), clock.handle()).unwrap();
        reg.insert(tank).unwrap();

        assert!(reg.group("PP", "", &["P1", "T1"]).is_err());
        assert!(reg.group("PP", "", &["P1", "P9"]).is_err());
        let err = reg.group("PP", "", &["P1", "P1"]).unwrap_err();
        assert_eq!(err, EquipmentError::DuplicateName { name: "P1".into() });
        assert_eq!(reg.len(), 3);
        assert!(reg.contains("P1"));

        reg.group("PP", "primary pumps", &["P1", "P2"]).unwrap();
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["T1", "PP"]);
        match reg.get("PP") {
            Some(EquipmentKind::ParallelGroup(g)) => assert_eq!(g.members().len(), 2),
            other => panic!("expected a group, got {other:?}"),
        }
    }

    #[test]
    fn start_only_on_on_off_equipment() {
        let clock = ManualClock::new(0.0);
        let mut reg = Registry::new();
        reg.insert(fan("SF", &clock)).unwrap();
        let tank = Tank::new("T1", "", TankConfig::default(), clock.handle()).unwrap();
        reg.insert(tank).unwrap();

        reg.require_mut("SF").unwrap().start().unwrap();
        assert!(reg.require_mut("T1").unwrap().start().is_err());
        assert!(reg.require_mut("nope").is_err());
        reg.refresh_all().unwrap();
    }
}
