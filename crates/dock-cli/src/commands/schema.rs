use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Handle `dock schema`.
pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&ctx.schema()?, flags.format)
}
