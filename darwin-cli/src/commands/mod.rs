//! CLI command implementations.

use std::path::Path;

use darwin_migrate::{Migration, Migrator, parse_file};
use darwin_postgres::{PgLedger, PgPool};
use tracing::debug;

use crate::cli::{Cli, DatabaseArgs};
use crate::config::{CONFIG_FILE_NAME, Config};
use crate::error::{CliError, CliResult};

pub mod check;
pub mod info;
pub mod migrate;
pub mod pending;
pub mod records;
pub mod validate;

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Configuration loaded from `darwin.toml`
    pub config: Config,
    /// Emit JSON instead of styled output
    pub json: bool,
}

impl Context {
    /// Build the context from parsed arguments.
    ///
    /// A missing `darwin.toml` is fine; a missing file passed with `--config`
    /// is an error.
    pub fn load(cli: &Cli) -> CliResult<Self> {
        let config = if cli.config.as_os_str() == CONFIG_FILE_NAME {
            Config::load_or_default(&cli.config)?
        } else {
            Config::load(&cli.config).map_err(|e| {
                CliError::Config(format!("{}: {}", cli.config.display(), e))
            })?
        };
        Ok(Self {
            config,
            json: cli.json,
        })
    }

    /// Connect to the configured database and load the declared migrations.
    pub async fn migrator(&self, args: &DatabaseArgs) -> CliResult<Migrator<PgLedger>> {
        let config = self.config.clone().merge(args);
        let migrations = load_migrations(&config.migrations.file).await?;
        let pool = PgPool::from_url(config.database_url()?)?;

        debug!(
            host = %pool.config().host,
            database = %pool.config().database,
            table = %config.migrations.table,
            "Using ledger"
        );
        Ok(Migrator::with_config(
            config.migration_config()?,
            PgLedger::new(pool),
            migrations,
        ))
    }
}

/// Read and parse a migration document.
pub async fn load_migrations(path: &Path) -> CliResult<Vec<Migration>> {
    if !path.exists() {
        return Err(CliError::Config(format!(
            "Migration file not found: {}",
            path.display()
        )));
    }
    Ok(parse_file(path).await?)
}

/// `1.5 add email` for list output.
pub(crate) fn describe(migration: &Migration) -> String {
    format!("{} {}", migration.version, migration.description)
}
