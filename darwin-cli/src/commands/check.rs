//! `darwin check` command - Parse a migration file offline.

use crate::cli::CheckArgs;
use crate::commands::{Context, describe, load_migrations};
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the check command
pub async fn run(ctx: &Context, args: CheckArgs) -> CliResult<()> {
    let path = args
        .file
        .unwrap_or_else(|| ctx.config.migrations.file.clone());
    let migrations = load_migrations(&path).await?;

    if ctx.json {
        return output::json(&migrations);
    }

    output::header("Check Migrations");
    output::kv("File", &path.display().to_string());
    output::newline();

    for migration in &migrations {
        output::list_item(&format!(
            "{}  {}",
            describe(migration),
            &migration.checksum()[..12]
        ));
    }

    output::newline();
    success(&format!("{} migrations parsed", migrations.len()));
    Ok(())
}
