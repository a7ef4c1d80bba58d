//! `darwin migrate` command - Apply pending migrations.

use serde::Serialize;

use darwin_migrate::MigrationRecord;

use crate::cli::DatabaseArgs;
use crate::commands::Context;
use crate::error::CliResult;
use crate::output::{self, success};

#[derive(Serialize)]
struct MigrateOutput<'a> {
    applied: &'a [MigrationRecord],
    duration_ms: u64,
}

/// Run the migrate command
pub async fn run(ctx: &Context, args: DatabaseArgs) -> CliResult<()> {
    let migrator = ctx.migrator(&args).await?;
    let report = migrator.migrate().await?;

    if ctx.json {
        return output::json(&MigrateOutput {
            applied: &report.applied,
            duration_ms: u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
        });
    }

    output::header("Migrate");
    output::kv("Table", migrator.config().table.as_str());
    output::kv("Declared", &migrator.migrations().len().to_string());
    output::newline();

    if !report.has_changes() {
        output::info("Database is up to date");
        return Ok(());
    }

    for record in &report.applied {
        output::list_item(&format!(
            "{} {} ({}ms)",
            record.version,
            record.description,
            record.execution_time.as_millis()
        ));
    }
    output::newline();
    success(&report.summary());
    Ok(())
}
