use std::collections::HashMap;
use tracing::{debug, warn};

use super::errors::{ConfigurationError, TransitionError};
use super::types::{EntityMachineConfig, StateValue};
use crate::naming;

/// Source of per-table state machine blocks
pub trait StateConfigProvider {
    /// Block for `table`, or `None` when the table has no state-tracked fields.
    fn state_machine_config(&self, table: &str) -> Option<EntityMachineConfig>;
}

impl StateConfigProvider for HashMap<String, EntityMachineConfig> {
    fn state_machine_config(&self, table: &str) -> Option<EntityMachineConfig> {
        self.get(table).cloned()
    }
}

/// Transition validator for the state field of one entity.
///
/// Built once per request from the entity's configuration block and discarded
/// afterwards. `set_states` must run before `is_transitive`/`is_initial` give
/// meaningful answers, and `set_initial` before `initial`.
#[derive(Debug, Clone)]
pub struct StateMachine {
    entity: String,
    machine: EntityMachineConfig,
    field: Option<String>,
    states: HashMap<StateValue, Vec<StateValue>>,
    initial_states: Vec<StateValue>,
    initial: Option<StateValue>,
}

impl StateMachine {
    pub fn new(entity: &str, provider: &dyn StateConfigProvider) -> Self {
        let table = naming::table_name(entity);
        let machine = provider.state_machine_config(&table).unwrap_or_default();
        let field = machine.first_field().map(str::to_string);
        debug!(entity = %entity, table = %table, field = ?field, "State machine loaded");

        Self {
            entity: entity.to_string(),
            machine,
            field,
            states: HashMap::new(),
            initial_states: Vec::new(),
            initial: None,
        }
    }

    /// Build the machine and prepare its tracked field, or `None` when the
    /// entity has no enabled state field.
    pub fn load_tracked(
        entity: &str,
        provider: &dyn StateConfigProvider,
    ) -> Result<Option<Self>, ConfigurationError> {
        let mut machine = Self::new(entity, provider);
        let Some(field) = machine.field.clone() else {
            return Ok(None);
        };
        if !machine.is_stated_field(&field) {
            return Ok(None);
        }
        machine.set_states(&field)?;
        machine.set_initial(&field)?;
        Ok(Some(machine))
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn is_stated_field(&self, field: &str) -> bool {
        self.machine
            .field(field)
            .is_some_and(|config| config.enabled && !config.transitions.is_empty())
    }

    pub fn set_states(&mut self, field: &str) -> Result<(), ConfigurationError> {
        let config = self
            .machine
            .field(field)
            .filter(|config| !config.transitions.is_empty())
            .ok_or_else(|| ConfigurationError::MissingStates {
                field: field.to_string(),
            })?;

        self.states = config.transitions.clone();
        self.initial_states = config.initial.clone();
        Ok(())
    }

    pub fn set_initial(&mut self, field: &str) -> Result<(), ConfigurationError> {
        let initial = self
            .machine
            .field(field)
            .and_then(|config| config.initial.first())
            .filter(|state| !is_blank(state))
            .ok_or_else(|| ConfigurationError::MissingInitial {
                field: field.to_string(),
            })?;

        self.initial = Some(initial.clone());
        Ok(())
    }

    /// Self-transitions are always legal; a state with no configured
    /// transitions has no legal successors.
    pub fn is_transitive(&self, from: &StateValue, to: &StateValue) -> bool {
        from == to
            || self
                .states
                .get(from)
                .is_some_and(|allowed| allowed.contains(to))
    }

    pub fn is_initial(&self, state: &StateValue) -> bool {
        self.initial_states.contains(state)
    }

    pub fn initial(&self) -> Option<&StateValue> {
        self.initial.as_ref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Validate a state change before it reaches the gateway.
    pub fn check_transition(
        &self,
        from: &StateValue,
        to: &StateValue,
    ) -> Result<(), TransitionError> {
        let field = self.tracked_field()?;
        if self.is_transitive(from, to) {
            return Ok(());
        }

        warn!(
            entity = %self.entity,
            field = %field,
            from = %from,
            to = %to,
            "Rejected state transition"
        );
        Err(TransitionError::NotAllowed {
            field: field.to_string(),
            from: from.clone(),
            to: to.clone(),
        })
    }

    /// Validate the state a new record starts in.
    pub fn check_entry(&self, state: &StateValue) -> Result<(), TransitionError> {
        let field = self.tracked_field()?;
        if self.is_initial(state) {
            return Ok(());
        }

        warn!(entity = %self.entity, field = %field, state = %state, "Rejected entry state");
        Err(TransitionError::NotInitial {
            field: field.to_string(),
            state: state.clone(),
        })
    }

    fn tracked_field(&self) -> Result<&str, TransitionError> {
        self.field
            .as_deref()
            .ok_or_else(|| TransitionError::UntrackedEntity {
                entity: self.entity.clone(),
            })
    }
}

fn is_blank(state: &StateValue) -> bool {
    matches!(state, StateValue::Str(s) if s.is_empty())
}
