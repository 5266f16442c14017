use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::{Commands, LoadArgs, PlanArgs};

/// Top-level CLI parser for the `dock` binary.
#[derive(Debug, Parser)]
#[command(
    name = "dock",
    version,
    about = "Load a directory tree of tabular data into a store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Extra config file, layered above .dock/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Schema file (overrides store.schema)
    #[arg(short, long, global = true)]
    pub schema: Option<PathBuf>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            config: self.config.clone(),
            schema: self.schema.clone(),
        }
    }
}
