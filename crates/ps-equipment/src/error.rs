//! Error types for equipment operations.

use ps_core::CoreError;
use ps_transient::SimError;
use thiserror::Error;

/// Errors raised by equipment façades and the registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EquipmentError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Equipment '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Unknown equipment '{name}'")]
    UnknownEquipment { name: String },

    #[error("'{equipment}' has no reading '{reading}'")]
    UnknownReading { equipment: String, reading: String },

    #[error(transparent)]
    Sim(#[from] SimError),
}

pub type EquipmentResult<T> = Result<T, EquipmentError>;

impl EquipmentError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidArg { what: what.into() }
    }

    pub(crate) fn unknown_reading(equipment: &str, reading: &str) -> Self {
        Self::UnknownReading {
            equipment: equipment.to_string(),
            reading: reading.to_string(),
        }
    }
}

impl From<CoreError> for EquipmentError {
    fn from(e: CoreError) -> Self {
        Self::Sim(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EquipmentError::unknown_reading("P_1", "torque");
        assert!(err.to_string().contains("torque"));
    }

    #[test]
    fn sim_errors_convert() {
        let err: EquipmentError = SimError::CyclicReference {
            name: "loop".into(),
        }
        .into();
        assert!(matches!(err, EquipmentError::Sim(SimError::CyclicReference { .. })));
    }
}
