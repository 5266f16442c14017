use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Print the ordered load plan for a data tree.
    Plan(PlanArgs),
    /// Load a data tree into the configured store.
    Load(LoadArgs),
    /// Print the entity schema.
    Schema,
}

#[derive(Clone, Debug, Args)]
pub struct PlanArgs {
    /// Root directory of the data tree (must hold a manifest).
    pub root: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct LoadArgs {
    /// Root directory of the data tree (must hold a manifest).
    pub root: PathBuf,

    /// Load into a throwaway in-memory store instead of the configured one.
    #[arg(long)]
    pub dry_run: bool,
}
