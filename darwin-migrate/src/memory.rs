//! In-memory ledger store.
//!
//! Scripts are recorded rather than executed. Work done inside a
//! [`TransactionMode::PerMigration`] unit only becomes visible on commit, and
//! faults can be injected to exercise the failure paths of the applier.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{MigrateResult, MigrationError};
use crate::ledger::{LedgerStore, LedgerTransaction, MigrationRecord, TransactionMode};
use crate::sql::TableName;

#[derive(Debug, Default)]
struct State {
    tables: HashMap<TableName, Vec<MigrationRecord>>,
    executed: Vec<String>,
    commits: usize,
    rollbacks: usize,
}

#[derive(Debug, Default)]
struct Faults {
    scripts: Vec<String>,
    commit: bool,
    rollback: bool,
}

/// A [`LedgerStore`] kept in process memory.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<State>>,
    faults: Arc<Faults>,
}

impl MemoryLedger {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any script containing `fragment`.
    pub fn fail_script(self, fragment: impl Into<String>) -> Self {
        self.with_faults(|f| f.scripts.push(fragment.into()))
    }

    /// Fail every commit.
    pub fn fail_commit(self) -> Self {
        self.with_faults(|f| f.commit = true)
    }

    /// Fail every rollback.
    pub fn fail_rollback(self) -> Self {
        self.with_faults(|f| f.rollback = true)
    }

    fn with_faults(self, update: impl FnOnce(&mut Faults)) -> Self {
        let mut faults = Faults {
            scripts: self.faults.scripts.clone(),
            commit: self.faults.commit,
            rollback: self.faults.rollback,
        };
        update(&mut faults);
        Self {
            state: self.state,
            faults: Arc::new(faults),
        }
    }

    /// Insert ledger entries directly, creating the table if needed.
    pub fn seed(&self, table: &TableName, records: impl IntoIterator<Item = MigrationRecord>) {
        let mut state = self.state.lock();
        state
            .tables
            .entry(table.clone())
            .or_default()
            .extend(records);
    }

    /// Scripts that took effect, in execution order.
    pub fn executed(&self) -> Vec<String> {
        self.state.lock().executed.clone()
    }

    /// Number of committed transactions.
    pub fn commits(&self) -> usize {
        self.state.lock().commits
    }

    /// Number of rolled back transactions.
    pub fn rollbacks(&self) -> usize {
        self.state.lock().rollbacks
    }

    fn check_script(&self, script: &str) -> MigrateResult<()> {
        match self.faults.scripts.iter().find(|f| script.contains(f.as_str())) {
            Some(fragment) => Err(MigrationError::database(format!(
                "syntax error at or near \"{}\"",
                fragment
            ))),
            None => Ok(()),
        }
    }
}

fn missing_table(table: &TableName) -> MigrationError {
    MigrationError::database(format!("relation \"{}\" does not exist", table))
}

fn duplicate_version(table: &TableName) -> MigrationError {
    MigrationError::database(format!(
        "duplicate key value violates unique constraint \"{}_version_key\"",
        table
    ))
}

fn check_insert(
    tables: &HashMap<TableName, Vec<MigrationRecord>>,
    table: &TableName,
    record: &MigrationRecord,
) -> MigrateResult<()> {
    let rows = tables.get(table).ok_or_else(|| missing_table(table))?;
    if rows.iter().any(|r| r.version == record.version) {
        return Err(duplicate_version(table));
    }
    Ok(())
}

fn insert_into(
    tables: &mut HashMap<TableName, Vec<MigrationRecord>>,
    table: &TableName,
    record: MigrationRecord,
) -> MigrateResult<()> {
    check_insert(tables, table, &record)?;
    tables.entry(table.clone()).or_default().push(record);
    Ok(())
}

#[async_trait::async_trait]
impl LedgerStore for MemoryLedger {
    async fn create_table(&self, table: &TableName) -> MigrateResult<()> {
        self.state.lock().tables.entry(table.clone()).or_default();
        Ok(())
    }

    async fn query_all(&self, table: &TableName) -> MigrateResult<Vec<MigrationRecord>> {
        let state = self.state.lock();
        let mut records = state.tables.get(table).cloned().unwrap_or_default();
        records.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(records)
    }

    async fn begin<'a>(
        &'a self,
        mode: TransactionMode,
    ) -> MigrateResult<Box<dyn LedgerTransaction + 'a>> {
        Ok(Box::new(MemoryTransaction {
            ledger: self,
            mode,
            scripts: Vec::new(),
            records: Vec::new(),
        }))
    }
}

struct MemoryTransaction<'a> {
    ledger: &'a MemoryLedger,
    mode: TransactionMode,
    scripts: Vec<String>,
    records: Vec<(TableName, MigrationRecord)>,
}

#[async_trait::async_trait]
impl LedgerTransaction for MemoryTransaction<'_> {
    async fn execute(&mut self, script: &str) -> MigrateResult<()> {
        self.ledger.check_script(script)?;
        match self.mode {
            TransactionMode::PerMigration => self.scripts.push(script.to_string()),
            TransactionMode::None => self.ledger.state.lock().executed.push(script.to_string()),
        }
        Ok(())
    }

    async fn insert_record(
        &mut self,
        table: &TableName,
        record: &MigrationRecord,
    ) -> MigrateResult<()> {
        let mut state = self.ledger.state.lock();
        match self.mode {
            TransactionMode::PerMigration => {
                let committed = state.tables.get(table).ok_or_else(|| missing_table(table))?;
                let staged = self
                    .records
                    .iter()
                    .filter(|(t, _)| t == table)
                    .map(|(_, r)| r);
                if committed.iter().chain(staged).any(|r| r.version == record.version) {
                    return Err(duplicate_version(table));
                }
                self.records.push((table.clone(), record.clone()));
                Ok(())
            }
            TransactionMode::None => insert_into(&mut state.tables, table, record.clone()),
        }
    }

    async fn commit(&mut self) -> MigrateResult<()> {
        if self.mode == TransactionMode::None {
            return Ok(());
        }
        if self.ledger.faults.commit {
            return Err(MigrationError::database("could not commit: connection reset"));
        }

        let mut state = self.ledger.state.lock();
        // Nothing is applied unless every staged record fits, so a failed
        // commit leaves the work staged for rollback.
        for (table, record) in &self.records {
            check_insert(&state.tables, table, record)?;
        }
        for (table, record) in self.records.drain(..) {
            state.tables.entry(table).or_default().push(record);
        }
        state.executed.append(&mut self.scripts);
        state.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> MigrateResult<()> {
        if self.mode == TransactionMode::None {
            return Ok(());
        }
        if self.ledger.faults.rollback {
            return Err(MigrationError::database("could not roll back: connection closed"));
        }

        self.scripts.clear();
        self.records.clear();
        self.ledger.state.lock().rollbacks += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::migration::Migration;

    fn record(version: f64) -> MigrationRecord {
        let migration = Migration::new(version, "test", "SELECT 1;");
        MigrationRecord::for_migration(&migration, Utc::now(), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_missing_table_reads_empty() {
        let store = MemoryLedger::new();
        assert!(store.query_all(&TableName::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_all_sorted_ascending() {
        let store = MemoryLedger::new();
        let table = TableName::default();
        store.seed(&table, [record(3.0), record(1.0), record(2.0)]);

        let versions: Vec<f64> = store
            .query_all(&table)
            .await
            .unwrap()
            .iter()
            .map(|r| r.version.as_f64())
            .collect();
        assert_eq!(versions, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_work_visible_only_after_commit() {
        let store = MemoryLedger::new();
        let table = TableName::default();
        store.create_table(&table).await.unwrap();

        let mut tx = store.begin(TransactionMode::PerMigration).await.unwrap();
        tx.execute("CREATE TABLE a (id INT);").await.unwrap();
        tx.insert_record(&table, &record(1.0)).await.unwrap();
        assert!(store.executed().is_empty());
        assert!(store.query_all(&table).await.unwrap().is_empty());

        tx.commit().await.unwrap();
        assert_eq!(store.executed(), vec!["CREATE TABLE a (id INT);"]);
        assert_eq!(store.query_all(&table).await.unwrap().len(), 1);
        assert_eq!(store.commits(), 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_work() {
        let store = MemoryLedger::new();
        let table = TableName::default();
        store.create_table(&table).await.unwrap();

        let mut tx = store.begin(TransactionMode::PerMigration).await.unwrap();
        tx.execute("CREATE TABLE a (id INT);").await.unwrap();
        tx.insert_record(&table, &record(1.0)).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(store.executed().is_empty());
        assert!(store.query_all(&table).await.unwrap().is_empty());
        assert_eq!(store.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_conflicting_commit_keeps_work_staged() {
        let store = MemoryLedger::new();
        let table = TableName::default();
        store.create_table(&table).await.unwrap();

        let mut tx = store.begin(TransactionMode::PerMigration).await.unwrap();
        tx.execute("CREATE TABLE a (id INT);").await.unwrap();
        tx.insert_record(&table, &record(1.0)).await.unwrap();
        // Another writer takes the version before this unit commits.
        store.seed(&table, [record(1.0)]);

        let err = tx.commit().await.unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
        assert!(store.executed().is_empty());
        assert_eq!(store.commits(), 0);
        assert_eq!(store.query_all(&table).await.unwrap().len(), 1);

        tx.rollback().await.unwrap();
        assert_eq!(store.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_insert_requires_table() {
        let store = MemoryLedger::new();
        let mut tx = store.begin(TransactionMode::PerMigration).await.unwrap();
        let err = tx
            .insert_record(&TableName::default(), &record(1.0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let store = MemoryLedger::new().fail_script("DROP").fail_commit();
        let mut tx = store.begin(TransactionMode::PerMigration).await.unwrap();
        assert!(tx.execute("DROP TABLE a;").await.is_err());
        assert!(tx.execute("SELECT 1;").await.is_ok());
        assert!(tx.commit().await.is_err());
        assert!(tx.rollback().await.is_ok());
    }
}
