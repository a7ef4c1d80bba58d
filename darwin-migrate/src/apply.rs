//! Applying planned migrations.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{ApplyPhase, MigrateResult, MigrationError};
use crate::ledger::{LedgerStore, LedgerTransaction, MigrationRecord, TransactionMode};
use crate::migration::Migration;
use crate::sql::TableName;

/// Apply migrations one after another, stopping at the first failure.
///
/// Each migration runs in its own unit of work together with its ledger
/// entry. Migrations committed before a failure stay applied. Returns the
/// ledger entries written, in order.
pub async fn apply<S>(
    store: &S,
    table: &TableName,
    plan: &[Migration],
    mode: TransactionMode,
) -> MigrateResult<Vec<MigrationRecord>>
where
    S: LedgerStore + ?Sized,
{
    let mut applied = Vec::with_capacity(plan.len());
    for migration in plan {
        let record = apply_one(store, table, migration, mode).await?;
        applied.push(record);
    }
    Ok(applied)
}

async fn apply_one<S>(
    store: &S,
    table: &TableName,
    migration: &Migration,
    mode: TransactionMode,
) -> MigrateResult<MigrationRecord>
where
    S: LedgerStore + ?Sized,
{
    let version = migration.version;
    debug!(version = %version, ?mode, "Beginning migration");

    let mut tx = store
        .begin(mode)
        .await
        .map_err(|e| MigrationError::apply(version, ApplyPhase::Begin, e.to_string()))?;

    let applied_at = Utc::now();
    let start = Instant::now();

    if let Err(e) = tx.execute(&migration.script).await {
        return Err(abort(&mut *tx, migration, ApplyPhase::Execute, e).await);
    }

    let record = MigrationRecord::for_migration(migration, applied_at, start.elapsed());

    if let Err(e) = tx.insert_record(table, &record).await {
        return Err(abort(&mut *tx, migration, ApplyPhase::RecordInsert, e).await);
    }

    if let Err(e) = tx.commit().await {
        return Err(abort(&mut *tx, migration, ApplyPhase::Commit, e).await);
    }

    info!(
        version = %version,
        description = %migration.description,
        duration_ms = record.execution_time.as_millis() as u64,
        "Applied migration"
    );
    Ok(record)
}

/// Roll back after a failure and build the error to surface.
async fn abort<T>(
    tx: &mut T,
    migration: &Migration,
    phase: ApplyPhase,
    cause: MigrationError,
) -> MigrationError
where
    T: LedgerTransaction + ?Sized,
{
    let version = migration.version;
    warn!(version = %version, %phase, error = %cause, "Migration failed, rolling back");

    match tx.rollback().await {
        Ok(()) => MigrationError::apply(version, phase, cause.to_string()),
        Err(rollback) => MigrationError::RollbackFailed {
            version,
            phase,
            message: cause.to_string(),
            rollback: rollback.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedger;
    use crate::migration::Version;

    fn plan() -> Vec<Migration> {
        vec![
            Migration::new(1.0, "create a", "CREATE TABLE a (id INT);"),
            Migration::new(2.0, "create b", "CREATE TABLE b (id INT);"),
        ]
    }

    #[tokio::test]
    async fn test_applies_in_order() {
        let store = MemoryLedger::new();
        let table = TableName::default();
        store.create_table(&table).await.unwrap();

        let records = apply(&store, &table, &plan(), TransactionMode::PerMigration)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            store.executed(),
            vec!["CREATE TABLE a (id INT);", "CREATE TABLE b (id INT);"]
        );
        let ledger = store.query_all(&table).await.unwrap();
        assert_eq!(ledger, records);
        assert_eq!(ledger[0].checksum, plan()[0].checksum());
    }

    #[tokio::test]
    async fn test_execute_failure_stops_and_rolls_back() {
        let store = MemoryLedger::new().fail_script("CREATE TABLE b");
        let table = TableName::default();
        store.create_table(&table).await.unwrap();

        let err = apply(&store, &table, &plan(), TransactionMode::PerMigration)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MigrationError::Apply { version, phase: ApplyPhase::Execute, .. } if version == Version::new(2.0)
        ));
        let ledger = store.query_all(&table).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].version, Version::new(1.0));
        assert_eq!(store.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_insert_failure_reports_phase() {
        let store = MemoryLedger::new();
        let table = TableName::default();
        store.create_table(&table).await.unwrap();
        apply(&store, &table, &plan()[..1], TransactionMode::PerMigration)
            .await
            .unwrap();

        // Same version again violates the ledger's unique constraint.
        let err = apply(&store, &table, &plan()[..1], TransactionMode::PerMigration)
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::Apply { phase: ApplyPhase::RecordInsert, .. }));
        assert!(err.to_string().contains("during record insert"));
        assert_eq!(store.query_all(&table).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back_and_stops() {
        let store = MemoryLedger::new().fail_commit();
        let table = TableName::default();
        store.create_table(&table).await.unwrap();

        let err = apply(&store, &table, &plan(), TransactionMode::PerMigration)
            .await
            .unwrap_err();

        assert!(!err.is_fatal());
        assert!(matches!(
            err,
            MigrationError::Apply { version, phase: ApplyPhase::Commit, .. } if version == Version::new(1.0)
        ));
        assert!(err.to_string().contains("during commit"));
        assert!(store.query_all(&table).await.unwrap().is_empty());
        assert!(store.executed().is_empty());
        assert_eq!(store.rollbacks(), 1);
        assert_eq!(store.commits(), 0);
    }

    #[tokio::test]
    async fn test_commit_failure_with_rollback_failure_is_fatal() {
        let store = MemoryLedger::new().fail_commit().fail_rollback();
        let table = TableName::default();
        store.create_table(&table).await.unwrap();

        let err = apply(&store, &table, &plan(), TransactionMode::PerMigration)
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(err, MigrationError::RollbackFailed { phase: ApplyPhase::Commit, .. }));
        assert!(store.query_all(&table).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_without_transaction_keeps_partial_work() {
        let store = MemoryLedger::new().fail_script("CREATE TABLE b");
        let table = TableName::default();
        store.create_table(&table).await.unwrap();

        let err = apply(&store, &table, &plan(), TransactionMode::None)
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::Apply { phase: ApplyPhase::Execute, .. }));
        assert_eq!(store.query_all(&table).await.unwrap().len(), 1);
    }
}
