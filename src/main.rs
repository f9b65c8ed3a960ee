use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use apiforge::cli::commands::{
    CheckCommand, Command, DescribeCommand, InitialCommand, TransitionCommand,
};
use apiforge::cli::{Cli, Commands};
use apiforge::config::{config, init_config};
use apiforge::telemetry::init_telemetry;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_config(cli.config.as_deref())?;
    let config = config()?;
    init_telemetry(&config.observability)?;

    let command: Box<dyn Command> = match cli.command {
        Commands::Check => Box::new(CheckCommand),
        Commands::Transition {
            entity,
            from,
            to,
            field,
        } => Box::new(TransitionCommand {
            entity,
            from,
            to,
            field,
        }),
        Commands::Initial { entity, field } => Box::new(InitialCommand { entity, field }),
        Commands::Describe { entity, relation } => {
            Box::new(DescribeCommand { entity, relation })
        }
    };

    let exit = command.execute(config)?;
    apiforge::resolver_metrics().log_stats();
    Ok(exit)
}
