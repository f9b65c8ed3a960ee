use anyhow::{anyhow, Result};
use std::process::ExitCode;

use crate::config::ApiForgeConfig;
use crate::state_machine::StateMachine;

pub mod check;
pub mod describe;
pub mod initial;
pub mod transition;

pub use check::CheckCommand;
pub use describe::DescribeCommand;
pub use initial::InitialCommand;
pub use transition::TransitionCommand;

pub trait Command {
    fn execute(&self, config: &ApiForgeConfig) -> Result<ExitCode>;
}

/// Field named on the command line, or the first field configured for the entity
fn resolve_field(machine: &StateMachine, field: Option<&str>) -> Result<String> {
    field
        .or_else(|| machine.field())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No state field is configured for {}", machine.entity()))
}
