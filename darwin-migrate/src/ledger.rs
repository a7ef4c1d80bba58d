//! The applied-migration ledger and the store boundary it lives behind.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MigrateResult;
use crate::migration::{Migration, Version};
use crate::sql::TableName;

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Version of the applied migration.
    pub version: Version,
    /// Description at the time it was applied.
    pub description: String,
    /// Checksum of the script that was applied.
    pub checksum: String,
    /// When the migration started executing.
    pub applied_at: DateTime<Utc>,
    /// How long the script took.
    pub execution_time: Duration,
}

impl MigrationRecord {
    /// Build the record for a migration that just ran.
    pub fn for_migration(
        migration: &Migration,
        applied_at: DateTime<Utc>,
        execution_time: Duration,
    ) -> Self {
        Self {
            version: migration.version,
            description: migration.description.clone(),
            checksum: migration.checksum(),
            applied_at,
            execution_time,
        }
    }
}

/// How each migration is wrapped when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionMode {
    /// Script and ledger entry commit or roll back together.
    #[default]
    PerMigration,
    /// Statements run in autocommit mode; commit and rollback are no-ops.
    None,
}

/// Persistent storage for the ledger.
///
/// `query_all` must return records ordered by version, ascending.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create the ledger table if it does not exist.
    async fn create_table(&self, table: &TableName) -> MigrateResult<()>;

    /// Get all applied migrations.
    async fn query_all(&self, table: &TableName) -> MigrateResult<Vec<MigrationRecord>>;

    /// Open a unit of work for one migration.
    async fn begin<'a>(&'a self, mode: TransactionMode)
    -> MigrateResult<Box<dyn LedgerTransaction + 'a>>;
}

/// A unit of work opened by [`LedgerStore::begin`].
#[async_trait::async_trait]
pub trait LedgerTransaction: Send {
    /// Run a migration script as a single batch.
    async fn execute(&mut self, script: &str) -> MigrateResult<()>;

    /// Append a ledger entry.
    async fn insert_record(&mut self, table: &TableName, record: &MigrationRecord)
    -> MigrateResult<()>;

    /// Make the work durable.
    async fn commit(&mut self) -> MigrateResult<()>;

    /// Discard the work.
    async fn rollback(&mut self) -> MigrateResult<()>;
}

/// Sort records newest version first.
pub fn sort_descending(records: &mut [MigrationRecord]) {
    records.sort_by(|a, b| b.version.cmp(&a.version));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(version: f64) -> MigrationRecord {
        MigrationRecord {
            version: Version::new(version),
            description: format!("v{version}"),
            checksum: "abc".to_string(),
            applied_at: Utc::now(),
            execution_time: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_record_for_migration() {
        let migration = Migration::new(1.0, "create users", "CREATE TABLE users (id INT);");
        let now = Utc::now();
        let rec = MigrationRecord::for_migration(&migration, now, Duration::from_millis(150));

        assert_eq!(rec.version, Version::new(1.0));
        assert_eq!(rec.description, "create users");
        assert_eq!(rec.checksum, migration.checksum());
        assert_eq!(rec.applied_at, now);
        assert_eq!(rec.execution_time, Duration::from_millis(150));
    }

    #[test]
    fn test_sort_descending() {
        let mut records = vec![record(1.0), record(3.0), record(2.0)];
        sort_descending(&mut records);
        let versions: Vec<f64> = records.iter().map(|r| r.version.as_f64()).collect();
        assert_eq!(versions, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_default_mode_is_transactional() {
        assert_eq!(TransactionMode::default(), TransactionMode::PerMigration);
    }
}
