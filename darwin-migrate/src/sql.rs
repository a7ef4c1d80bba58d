//! SQL for the migration ledger table (PostgreSQL dialect).
//!
//! The only dynamic part of any statement is the table identifier, which can
//! only be obtained through [`TableName::new`].

use std::fmt;

use crate::error::{MigrateResult, MigrationError};

/// Default name of the ledger table.
pub const DEFAULT_TABLE_NAME: &str = "migration";

/// A validated ledger table identifier (`[A-Za-z_][A-Za-z0-9_]*`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validate a table name.
    pub fn new(name: impl Into<String>) -> MigrateResult<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(MigrationError::InvalidTableName(name));
        }
        Ok(Self(name))
    }

    /// The identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE_NAME.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `CREATE TABLE IF NOT EXISTS` for the ledger.
pub fn create_table_sql(table: &TableName) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {table} (
    id             INT GENERATED ALWAYS AS IDENTITY NOT NULL,
    version        DOUBLE PRECISION NOT NULL,
    description    TEXT NOT NULL,
    checksum       CHARACTER(64) NOT NULL CHECK (checksum <> ''),
    applied_at     TIMESTAMPTZ NOT NULL,
    execution_time INTERVAL NOT NULL,
    UNIQUE (version),
    PRIMARY KEY (id)
);"#
    )
}

/// Select every ledger entry, oldest version first.
///
/// `execution_time` comes back as whole microseconds (`BIGINT`).
pub fn select_all_sql(table: &TableName) -> String {
    format!(
        r#"SELECT
    version,
    description,
    checksum,
    applied_at,
    (EXTRACT(EPOCH FROM execution_time) * 1000000)::BIGINT AS execution_time_us
FROM {table}
ORDER BY version ASC;"#
    )
}

/// Insert one ledger entry.
///
/// Parameters: version, description, checksum, applied_at, execution time in
/// microseconds.
pub fn insert_sql(table: &TableName) -> String {
    format!(
        r#"INSERT INTO {table} (
    version,
    description,
    checksum,
    applied_at,
    execution_time
) VALUES ($1, $2, $3, $4, $5::BIGINT * INTERVAL '1 microsecond');"#
    )
}
