//! Core trait for equipment façades.

use std::fmt;

use ps_core::PointValue;

use crate::error::{EquipmentError, EquipmentResult};

/// A piece of simulated equipment.
///
/// Readings are pulled: [`reading`](Equipment::reading) refreshes the owned
/// systems at the current clock time and returns the named value.
pub trait Equipment: fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Apply any on/off transition, push the current parameters into the
    /// owned systems and evaluate each of them once.
    fn refresh(&mut self) -> EquipmentResult<()>;

    /// Reading called `key` as of the last refresh.
    ///
    /// # Errors
    ///
    /// [`EquipmentError::UnknownReading`] if `key` is not in
    /// [`reading_names`](Equipment::reading_names).
    fn value(&self, key: &str) -> EquipmentResult<PointValue>;

    /// Refresh, then return the reading called `key`.
    fn reading(&mut self, key: &str) -> EquipmentResult<PointValue> {
        self.refresh()?;
        self.value(key)
    }

    /// Names accepted by [`reading`](Equipment::reading).
    fn reading_names(&self) -> Vec<String>;

    /// Ask the equipment to run. Only on/off equipment supports it.
    fn start(&mut self) -> EquipmentResult<()> {
        Err(EquipmentError::invalid(format!(
            "'{}' cannot be started",
            self.name()
        )))
    }

    fn stop(&mut self) -> EquipmentResult<()> {
        Err(EquipmentError::invalid(format!(
            "'{}' cannot be stopped",
            self.name()
        )))
    }

    /// Refresh once and collect every reading.
    fn readings(&mut self) -> EquipmentResult<Vec<(String, PointValue)>> {
        self.refresh()?;
        self.reading_names()
            .into_iter()
            .map(|key| {
                let value = self.value(&key)?;
                Ok((key, value))
            })
            .collect()
    }
}
