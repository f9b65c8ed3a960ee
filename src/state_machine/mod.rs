// State Machine Module - config-driven transition validation for state fields
//
// Each table may declare state-tracked fields with their allowed transitions and
// entry states. The request layer asks the machine before mutating a state field.

pub mod errors;
pub mod machine;
pub mod types;

#[cfg(test)]
mod tests;

pub use errors::{ConfigurationError, TransitionError};
pub use machine::{StateConfigProvider, StateMachine};
pub use types::{EntityMachineConfig, FieldMachineConfig, StateValue};
