use anyhow::Context;
use dock_load::{Source, SourceLocator};

use crate::cli::{GlobalFlags, PlanArgs};
use crate::context::AppContext;
use crate::output::output;

/// Ordered sources the load would read.
pub fn plan(args: &PlanArgs, ctx: &AppContext) -> anyhow::Result<Vec<Source>> {
    let schema = ctx.schema()?;
    SourceLocator::new(ctx.config.source.clone())
        .locate(&args.root, &schema)
        .with_context(|| format!("failed to locate sources under {}", args.root.display()))
}

/// Handle `dock plan`.
pub fn handle(args: &PlanArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&plan(args, ctx)?, flags.format)
}
