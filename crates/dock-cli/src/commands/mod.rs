pub mod load;
pub mod plan;
pub mod schema;

use crate::cli::{Commands, GlobalFlags};
use crate::context::AppContext;

/// Route a parsed command to its handler.
pub fn dispatch(command: &Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Plan(args) => plan::handle(args, ctx, flags),
        Commands::Load(args) => load::handle(args, ctx, flags),
        Commands::Schema => schema::handle(ctx, flags),
    }
}
