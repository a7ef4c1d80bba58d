//! `darwin records` command - List applied migrations.

use crate::cli::DatabaseArgs;
use crate::commands::Context;
use crate::error::CliResult;
use crate::output;

/// Run the records command
pub async fn run(ctx: &Context, args: DatabaseArgs) -> CliResult<()> {
    let migrator = ctx.migrator(&args).await?;
    let records = migrator.records().await?;

    if ctx.json {
        return output::json(&records);
    }

    output::header("Applied Migrations");
    if records.is_empty() {
        output::info("No migrations have been applied");
        return Ok(());
    }

    for record in &records {
        println!(
            "  {:>8}  {}  {:>6}ms  {}",
            record.version.to_string(),
            record.applied_at.format("%Y-%m-%d %H:%M:%S"),
            record.execution_time.as_millis(),
            record.description
        );
    }
    Ok(())
}
