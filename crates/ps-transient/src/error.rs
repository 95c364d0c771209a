//! Error types for transient evaluation.

use ps_core::CoreError;
use thiserror::Error;

/// Result type for system construction and evaluation.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while building or evaluating a system.
///
/// Construction problems surface as [`SimError::Configuration`]; evaluation
/// only fails when the wiring around an element is wrong.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// Invalid construction parameter (τ ≤ 0, wrong input count, ...).
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    /// An input had a different shape than the system expects.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A computed or resolved value is outside the physical domain.
    #[error("Non-physical condition: {what}")]
    NonPhysical { what: String },

    /// A nested system was re-entered while already being evaluated.
    #[error("Cyclic reference while evaluating '{name}'")]
    CyclicReference { name: String },
}

impl SimError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        Self::Configuration { what: what.into() }
    }

    pub(crate) fn non_physical(what: impl Into<String>) -> Self {
        Self::NonPhysical { what: what.into() }
    }
}

impl From<CoreError> for SimError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::TypeMismatch { expected, found } => SimError::TypeMismatch { expected, found },
            CoreError::NonFinite { what, value } => SimError::NonPhysical {
                what: format!("{what} is not finite ({value})"),
            },
            CoreError::InvalidArg { what } => SimError::Configuration {
                what: what.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SimError::config("tau must be positive");
        assert!(err.to_string().contains("tau must be positive"));
    }

    #[test]
    fn core_type_mismatch_is_preserved() {
        let err: SimError = CoreError::TypeMismatch {
            expected: "analog value",
            found: "binary value",
        }
        .into();
        assert!(matches!(err, SimError::TypeMismatch { .. }));
    }
}
