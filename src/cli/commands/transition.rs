use anyhow::{Context, Result};
use std::process::ExitCode;

use super::{resolve_field, Command};
use crate::config::ApiForgeConfig;
use crate::state_machine::{StateMachine, StateValue};

pub struct TransitionCommand {
    pub entity: String,
    pub from: String,
    pub to: String,
    pub field: Option<String>,
}

impl Command for TransitionCommand {
    fn execute(&self, config: &ApiForgeConfig) -> Result<ExitCode> {
        let mut machine = StateMachine::new(&self.entity, config);
        let field = resolve_field(&machine, self.field.as_deref())?;
        machine
            .set_states(&field)
            .with_context(|| format!("Cannot check transitions of {}.{field}", self.entity))?;

        let from = StateValue::from_key(&self.from);
        let to = StateValue::from_key(&self.to);
        if machine.is_transitive(&from, &to) {
            println!("✅ {}.{field}: {from} -> {to} is allowed", self.entity);
            Ok(ExitCode::SUCCESS)
        } else {
            println!("❌ {}.{field}: {from} -> {to} is not allowed", self.entity);
            Ok(ExitCode::FAILURE)
        }
    }
}
