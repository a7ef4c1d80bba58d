//! Migration engine implementation.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::apply::apply;
use crate::error::MigrateResult;
use crate::ledger::{LedgerStore, MigrationRecord, TransactionMode, sort_descending};
use crate::migration::Migration;
use crate::plan::plan;
use crate::sql::TableName;
use crate::status::{MigrationInfo, resolve_all};
use crate::validate::validate;

/// Configuration for the migration engine.
#[derive(Debug, Clone, Default)]
pub struct MigrationConfig {
    /// Ledger table.
    pub table: TableName,
    /// How each migration is wrapped.
    pub transaction_mode: TransactionMode,
}

impl MigrationConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ledger table name.
    pub fn table_name(mut self, name: impl Into<String>) -> MigrateResult<Self> {
        self.table = TableName::new(name)?;
        Ok(self)
    }

    /// Run migrations without wrapping them in transactions.
    pub fn no_transaction(mut self) -> Self {
        self.transaction_mode = TransactionMode::None;
        self
    }
}

/// Result of a migration run.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Ledger entries written by this run, in order.
    pub applied: Vec<MigrationRecord>,
    /// Wall time of the whole run.
    pub duration: Duration,
}

impl MigrationReport {
    /// Number of migrations applied.
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// Check if anything was applied.
    pub fn has_changes(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Get a summary of the report.
    pub fn summary(&self) -> String {
        if self.applied.is_empty() {
            "No migrations applied".to_string()
        } else {
            format!(
                "{} applied in {}ms",
                self.applied.len(),
                self.duration.as_millis()
            )
        }
    }
}

/// Brings a database forward to a declared list of migrations.
///
/// `migrate` calls on the same instance are serialized; reads (`info`,
/// `records`, `pending`, `validate`) are not, and may observe a run in
/// progress. Nothing coordinates separate processes.
pub struct Migrator<S: LedgerStore> {
    config: MigrationConfig,
    migrations: Vec<Migration>,
    store: S,
    lock: Mutex<()>,
}

impl<S: LedgerStore> Migrator<S> {
    /// Create a migrator with the default configuration.
    pub fn new(store: S, migrations: Vec<Migration>) -> Self {
        Self::with_config(MigrationConfig::default(), store, migrations)
    }

    /// Create a migrator from config.
    pub fn with_config(config: MigrationConfig, store: S, migrations: Vec<Migration>) -> Self {
        Self {
            config,
            migrations,
            store,
            lock: Mutex::new(()),
        }
    }

    /// Start building a migrator around a store.
    pub fn builder(store: S) -> MigratorBuilder<S> {
        MigratorBuilder::new(store)
    }

    /// Get the configuration.
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Get the declared migrations.
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply every pending migration.
    ///
    /// Creates the ledger table if needed, validates the declared set and
    /// applies what the plan yields. Stops at the first failure; migrations
    /// committed before it stay applied.
    pub async fn migrate(&self) -> MigrateResult<MigrationReport> {
        let _guard = self.lock.lock().await;
        let start = Instant::now();
        let table = &self.config.table;

        self.store.create_table(table).await?;

        let records = self.store.query_all(table).await?;
        validate(&self.migrations, &records)?;

        let pending = plan(&records, &self.migrations);
        if pending.is_empty() {
            debug!(table = %table, "Database is up to date");
            return Ok(MigrationReport {
                applied: Vec::new(),
                duration: start.elapsed(),
            });
        }

        info!(table = %table, count = pending.len(), "Applying migrations");
        let applied = apply(&self.store, table, &pending, self.config.transaction_mode).await?;

        let report = MigrationReport {
            applied,
            duration: start.elapsed(),
        };
        info!(table = %table, "{}", report.summary());
        Ok(report)
    }

    /// Check the declared migrations against the ledger.
    pub async fn validate(&self) -> MigrateResult<()> {
        let records = self.store.query_all(&self.config.table).await?;
        validate(&self.migrations, &records)
    }

    /// Migrations the next `migrate` call would apply, in order.
    pub async fn pending(&self) -> MigrateResult<Vec<Migration>> {
        let records = self.store.query_all(&self.config.table).await?;
        Ok(plan(&records, &self.migrations))
    }

    /// Status of every declared migration, in declared order.
    pub async fn info(&self) -> MigrateResult<Vec<MigrationInfo>> {
        let records = self.records().await?;
        Ok(resolve_all(&records, &self.migrations))
    }

    /// Applied migrations, newest version first.
    pub async fn records(&self) -> MigrateResult<Vec<MigrationRecord>> {
        let mut records = self.store.query_all(&self.config.table).await?;
        sort_descending(&mut records);
        Ok(records)
    }
}

/// Builder for creating a migrator.
pub struct MigratorBuilder<S: LedgerStore> {
    store: S,
    config: MigrationConfig,
    migrations: Vec<Migration>,
}

impl<S: LedgerStore> MigratorBuilder<S> {
    /// Create a new builder.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: MigrationConfig::default(),
            migrations: Vec::new(),
        }
    }

    /// Add declared migrations.
    pub fn migrations(mut self, migrations: impl IntoIterator<Item = Migration>) -> Self {
        self.migrations.extend(migrations);
        self
    }

    /// Add a single migration.
    pub fn migration(mut self, migration: Migration) -> Self {
        self.migrations.push(migration);
        self
    }

    /// Set the ledger table name.
    pub fn table_name(mut self, name: impl Into<String>) -> MigrateResult<Self> {
        self.config = self.config.table_name(name)?;
        Ok(self)
    }

    /// Disable transactions.
    pub fn no_transaction(mut self) -> Self {
        self.config = self.config.no_transaction();
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MigrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the migrator.
    pub fn build(self) -> Migrator<S> {
        Migrator::with_config(self.config, self.store, self.migrations)
    }
}
