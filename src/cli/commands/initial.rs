use anyhow::{Context, Result};
use std::process::ExitCode;

use super::{resolve_field, Command};
use crate::config::ApiForgeConfig;
use crate::state_machine::StateMachine;

pub struct InitialCommand {
    pub entity: String,
    pub field: Option<String>,
}

impl Command for InitialCommand {
    fn execute(&self, config: &ApiForgeConfig) -> Result<ExitCode> {
        let mut machine = StateMachine::new(&self.entity, config);
        let field = resolve_field(&machine, self.field.as_deref())?;
        machine
            .set_initial(&field)
            .with_context(|| format!("No initial state for {}.{field}", self.entity))?;

        if let Some(initial) = machine.initial() {
            println!("{}", initial.to_key());
        }
        Ok(ExitCode::SUCCESS)
    }
}
