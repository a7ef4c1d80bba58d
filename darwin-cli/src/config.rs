//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use darwin_migrate::{DEFAULT_TABLE_NAME, MigrationConfig};

use crate::cli::DatabaseArgs;
use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "darwin.toml";

/// Default migration file (relative to project root)
pub const MIGRATIONS_FILE: &str = "migrations.sql";

/// Darwin CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationsConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> CliResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply command-line overrides
    pub fn merge(mut self, args: &DatabaseArgs) -> Self {
        if let Some(ref url) = args.url {
            self.database.url = Some(url.clone());
        }
        if let Some(ref file) = args.file {
            self.migrations.file = file.clone();
        }
        if let Some(ref table) = args.table {
            self.migrations.table = table.clone();
        }
        if args.no_transaction {
            self.migrations.transactional = false;
        }
        self
    }

    /// The database URL, which must be set somewhere
    pub fn database_url(&self) -> CliResult<&str> {
        self.database.url.as_deref().ok_or_else(|| {
            CliError::Config(format!(
                "no database URL: pass --url, set DATABASE_URL or add [database] url to {}",
                CONFIG_FILE_NAME
            ))
        })
    }

    /// Engine configuration for the migrator
    pub fn migration_config(&self) -> CliResult<MigrationConfig> {
        let config = MigrationConfig::new().table_name(self.migrations.table.as_str())?;
        Ok(if self.migrations.transactional {
            config
        } else {
            config.no_transaction()
        })
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: Option<String>,
}

/// Migration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Migration document
    pub file: PathBuf,

    /// Ledger table name
    pub table: String,

    /// Wrap each migration in a transaction
    pub transactional: bool,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(MIGRATIONS_FILE),
            table: DEFAULT_TABLE_NAME.to_string(),
            transactional: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use darwin_migrate::TransactionMode;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
            [database]
            url = "postgres://localhost/app"

            [migrations]
            file = "db/migrations.sql"
            table = "schema_ledger"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/app"));
        assert_eq!(config.migrations.file, PathBuf::from("db/migrations.sql"));
        assert_eq!(config.migrations.table, "schema_ledger");
        assert!(config.migrations.transactional);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.migrations.table, "migration");
        assert!(config.database_url().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_args_override_file() {
        let args = DatabaseArgs {
            url: Some("postgres://override/app".into()),
            file: None,
            table: Some("other".into()),
            no_transaction: true,
        };
        let config = Config::default().merge(&args);

        assert_eq!(config.database_url().unwrap(), "postgres://override/app");
        assert_eq!(config.migrations.file, PathBuf::from(MIGRATIONS_FILE));

        let engine = config.migration_config().unwrap();
        assert_eq!(engine.table.as_str(), "other");
        assert_eq!(engine.transaction_mode, TransactionMode::None);
    }

    #[test]
    fn test_invalid_table_is_config_error() {
        let args = DatabaseArgs {
            table: Some("bad-name".into()),
            ..Default::default()
        };
        let err = Config::default().merge(&args).migration_config().unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
