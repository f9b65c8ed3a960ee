use thiserror::Error;

use super::types::StateValue;

/// Error code reported when a field has no transition map.
pub const CODE_MISSING_STATES: u16 = 4001;
/// Error code reported when a field has no initial state.
pub const CODE_MISSING_INITIAL: u16 = 4002;
/// Error code reported when a machine block fails load-time validation.
pub const CODE_INVALID_MACHINE: u16 = 4003;
/// Error code reported when a relation catalog entry fails validation.
pub const CODE_INVALID_RELATION: u16 = 4004;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Bulk extension error: no states configured for field \"{field}\"")]
    MissingStates { field: String },
    #[error("There should be an initial value for: \"{field}\" field.")]
    MissingInitial { field: String },
    #[error("Invalid state machine for {table}.{field}: {reason}")]
    InvalidMachine {
        table: String,
        field: String,
        reason: String,
    },
    #[error("Invalid relation {entity}.{relation}: {reason}")]
    InvalidRelation {
        entity: String,
        relation: String,
        reason: String,
    },
}

impl ConfigurationError {
    pub fn code(&self) -> u16 {
        match self {
            ConfigurationError::MissingStates { .. } => CODE_MISSING_STATES,
            ConfigurationError::MissingInitial { .. } => CODE_MISSING_INITIAL,
            ConfigurationError::InvalidMachine { .. } => CODE_INVALID_MACHINE,
            ConfigurationError::InvalidRelation { .. } => CODE_INVALID_RELATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Transition of \"{field}\" from {from} to {to} is not allowed")]
    NotAllowed {
        field: String,
        from: StateValue,
        to: StateValue,
    },
    #[error("State {state} is not an initial state of \"{field}\"")]
    NotInitial { field: String, state: StateValue },
    #[error("No state field is configured for {entity}")]
    UntrackedEntity { entity: String },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
