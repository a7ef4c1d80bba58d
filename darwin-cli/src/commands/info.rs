//! `darwin info` command - Show the status of every declared migration.

use darwin_migrate::MigrationStatus;

use crate::cli::DatabaseArgs;
use crate::commands::Context;
use crate::error::CliResult;
use crate::output;

/// Run the info command
pub async fn run(ctx: &Context, args: DatabaseArgs) -> CliResult<()> {
    let migrator = ctx.migrator(&args).await?;
    let infos = migrator.info().await?;

    if ctx.json {
        return output::json(&infos);
    }

    output::header("Migration Status");
    for info in &infos {
        println!(
            "  {}  {:>8}  {}",
            output::style_status(info.status),
            info.migration.version.to_string(),
            info.migration.description
        );
    }
    output::newline();

    let count = |status: MigrationStatus| infos.iter().filter(|i| i.status == status).count();
    output::kv("Applied", &count(MigrationStatus::Applied).to_string());
    output::kv("Pending", &count(MigrationStatus::Pending).to_string());

    let ignored = count(MigrationStatus::Ignored);
    if ignored > 0 {
        output::kv("Ignored", &ignored.to_string());
        output::dim("  Ignored migrations sit below the highest applied version and will not run.");
    }
    Ok(())
}
