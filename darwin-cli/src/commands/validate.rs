//! `darwin validate` command - Compare declared migrations with the ledger.

use serde_json::json;

use crate::cli::DatabaseArgs;
use crate::commands::Context;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the validate command
pub async fn run(ctx: &Context, args: DatabaseArgs) -> CliResult<()> {
    let migrator = ctx.migrator(&args).await?;
    migrator.validate().await?;

    if ctx.json {
        return output::json(&json!({
            "valid": true,
            "declared": migrator.migrations().len(),
        }));
    }

    output::header("Validate Migrations");
    success(&format!(
        "{} declared migrations are consistent with the ledger",
        migrator.migrations().len()
    ));
    Ok(())
}
