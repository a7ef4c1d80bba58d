//! `darwin pending` command - List migrations the next run would apply.

use crate::cli::DatabaseArgs;
use crate::commands::{Context, describe};
use crate::error::CliResult;
use crate::output;

/// Run the pending command
pub async fn run(ctx: &Context, args: DatabaseArgs) -> CliResult<()> {
    let migrator = ctx.migrator(&args).await?;
    let pending = migrator.pending().await?;

    if ctx.json {
        return output::json(&pending);
    }

    output::header("Pending Migrations");
    if pending.is_empty() {
        output::info("Nothing to apply");
        return Ok(());
    }

    output::section(&format!("{} to apply", pending.len()));
    for migration in &pending {
        output::list_item(&describe(migration));
    }
    Ok(())
}
