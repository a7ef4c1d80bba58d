//! Error types for PostgreSQL operations.

use darwin_migrate::MigrationError;
use thiserror::Error;

/// Result type for PostgreSQL operations.
pub type PgResult<T> = Result<T, PgError>;

/// Errors that can occur during PostgreSQL operations.
#[derive(Error, Debug)]
pub enum PgError {
    /// Connection pool error.
    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// PostgreSQL error.
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A ledger row could not be read back.
    #[error("invalid ledger row: {0}")]
    Row(String),
}

impl PgError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a row mapping error.
    pub fn row(message: impl Into<String>) -> Self {
        Self::Row(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Pool(_) => true,
            Self::Postgres(e) => e.is_closed(),
            _ => false,
        }
    }

    /// SQLSTATE code reported by the server, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Postgres(e) => e.code().map(|c| c.code()),
            _ => None,
        }
    }
}

impl From<PgError> for MigrationError {
    fn from(err: PgError) -> Self {
        match err {
            PgError::Postgres(ref e) => match e.as_db_error() {
                Some(db) => MigrationError::database(format!(
                    "{} (SQLSTATE {})",
                    db.message(),
                    db.code().code()
                )),
                None => MigrationError::database(e.to_string()),
            },
            other => MigrationError::database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PgError::config("invalid URL");
        assert!(matches!(err, PgError::Config(_)));
        assert!(!err.is_connection_error());
        assert_eq!(err.code(), None);

        let err = PgError::row("version is NULL");
        assert_eq!(err.to_string(), "invalid ledger row: version is NULL");
    }

    #[test]
    fn test_into_migration_error() {
        let err: MigrationError = PgError::config("missing host").into();
        assert!(matches!(err, MigrationError::Database(ref msg) if msg.contains("missing host")));
    }
}
