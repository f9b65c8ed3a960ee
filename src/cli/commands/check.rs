use anyhow::Result;
use std::process::ExitCode;

use super::Command;
use crate::config::ApiForgeConfig;
use crate::state_machine::StateMachine;

pub struct CheckCommand;

impl Command for CheckCommand {
    fn execute(&self, config: &ApiForgeConfig) -> Result<ExitCode> {
        config.validate()?;

        println!("✅ Configuration is valid");
        println!("   Module: {}", config.module.name);
        println!("   Entities: {}", config.entities_dir().display());

        let mut tables: Vec<&String> = config.state_machine.keys().collect();
        tables.sort();
        if tables.is_empty() {
            println!("   State machines: none");
        }
        for table in tables {
            match StateMachine::load_tracked(table, config)? {
                Some(machine) => println!(
                    "   State machine: {}.{} (initial {})",
                    table,
                    machine.field().unwrap_or_default(),
                    machine
                        .initial()
                        .map(|state| state.to_key())
                        .unwrap_or_default()
                ),
                None => println!("   State machine: {table} (disabled)"),
            }
        }

        println!("   Declared relations: {}", config.relations.catalog.len());
        println!("   Unlink scope: {:?}", config.relations.unlink_scope);
        Ok(ExitCode::SUCCESS)
    }
}
