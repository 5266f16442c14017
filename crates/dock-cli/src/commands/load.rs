use anyhow::Context;
use dock_load::{LoadReport, Pipeline, load_tree};
use serde::Serialize;

use crate::cli::{GlobalFlags, LoadArgs};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub dry_run: bool,
    #[serde(flatten)]
    pub report: LoadReport,
}

pub fn load(args: &LoadArgs, ctx: &AppContext) -> anyhow::Result<LoadResponse> {
    let mut store = ctx.open_store(args.dry_run)?;
    let pipeline = Pipeline::from_config(&ctx.config);

    let report = load_tree(&args.root, &ctx.config.source, &pipeline, store.as_mut())
        .with_context(|| format!("failed to load {}", args.root.display()))?;

    Ok(LoadResponse {
        dry_run: args.dry_run,
        report,
    })
}

/// Handle `dock load`.
pub fn handle(args: &LoadArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&load(args, ctx)?, flags.format)
}
