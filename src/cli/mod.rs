use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "apiforge")]
#[command(about = "Inspect state machine and relation configuration of a JSON-API module")]
#[command(long_about = "apiforge loads the module configuration (apiforge.toml, \
                       APIFORGE__* environment variables) and answers the same questions \
                       the request layer asks: is a state transition allowed, what is the \
                       initial state, how is a relation stored.")]
pub struct Cli {
    /// Configuration file to load instead of ./apiforge.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate the configuration, then print a summary
    Check,
    /// Check whether a state transition is allowed (exit code 1 when denied)
    Transition {
        /// Entity name, e.g. Post
        #[arg(long)]
        entity: String,
        /// Current state
        #[arg(long)]
        from: String,
        /// Requested state
        #[arg(long)]
        to: String,
        /// State field; defaults to the first field configured for the entity
        #[arg(long)]
        field: Option<String>,
    },
    /// Print the state a new record of the entity starts in
    Initial {
        /// Entity name, e.g. Post
        #[arg(long)]
        entity: String,
        /// State field; defaults to the first field configured for the entity
        #[arg(long)]
        field: Option<String>,
    },
    /// Show how a relation of an entity is stored
    Describe {
        /// Entity name, e.g. Post
        #[arg(long)]
        entity: String,
        /// Relation name, e.g. tags
        #[arg(long)]
        relation: String,
    },
}
