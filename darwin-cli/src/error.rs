//! CLI error types and result alias.

use darwin_migrate::MigrationError;
use darwin_postgres::PgError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(darwin::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(darwin::config))]
    Config(String),

    /// Migration document could not be parsed
    #[error("Parse error: {0}")]
    #[diagnostic(
        code(darwin::parse),
        help("each migration starts with a header line: ---- <version> <description>")
    )]
    Parse(String),

    /// Declared migrations disagree with the ledger
    #[error("Validation error: {0}")]
    #[diagnostic(code(darwin::validation))]
    Validation(String),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(code(darwin::migration))]
    Migration(String),

    /// Rollback failed; the connection may hold an open transaction
    #[error("Fatal: {0}")]
    #[diagnostic(
        code(darwin::fatal),
        help("check the database for a transaction left open by this run")
    )]
    Fatal(String),

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(darwin::database))]
    Database(String),
}

impl From<MigrationError> for CliError {
    fn from(err: MigrationError) -> Self {
        match err {
            MigrationError::Parse(e) => CliError::Parse(e.to_string()),
            MigrationError::Io(e) => CliError::Io(e),
            e @ MigrationError::InvalidTableName(_) => CliError::Config(e.to_string()),
            MigrationError::Database(msg) => CliError::Database(msg),
            e if e.is_validation() => CliError::Validation(e.to_string()),
            e if e.is_fatal() => CliError::Fatal(e.to_string()),
            e => CliError::Migration(e.to_string()),
        }
    }
}

impl From<PgError> for CliError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Config(msg) => CliError::Config(msg),
            other => CliError::Database(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Migration(format!("Failed to serialize JSON: {}", err))
    }
}
