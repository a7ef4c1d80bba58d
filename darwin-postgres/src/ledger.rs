//! Ledger store backed by a PostgreSQL connection pool.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use darwin_migrate::sql::{create_table_sql, insert_sql, select_all_sql};
use darwin_migrate::{
    LedgerStore, LedgerTransaction, MigrateResult, MigrationRecord, TableName, TransactionMode,
    Version,
};
use deadpool_postgres::Object;
use tokio_postgres::Row;
use tracing::{debug, warn};

use crate::error::{PgError, PgResult};
use crate::pool::PgPool;

/// A [`LedgerStore`] over a [`PgPool`].
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    /// Create a store using the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn table_exists(client: &Object, table: &TableName) -> PgResult<bool> {
        let row = client
            .query_one("SELECT to_regclass($1) IS NOT NULL", &[&table.as_str()])
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn read_all(&self, table: &TableName) -> PgResult<Vec<MigrationRecord>> {
        let client = self.pool.get().await?;
        if !Self::table_exists(&client, table).await? {
            debug!(table = %table, "Ledger table does not exist yet");
            return Ok(Vec::new());
        }

        let sql = select_all_sql(table);
        debug!(sql = %sql, "Reading ledger");
        client.query(sql.as_str(), &[]).await?.iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: &Row) -> PgResult<MigrationRecord> {
    let version: f64 = row.try_get("version")?;
    let description: String = row.try_get("description")?;
    let checksum: String = row.try_get("checksum")?;
    let applied_at: DateTime<Utc> = row.try_get("applied_at")?;
    let micros: i64 = row.try_get("execution_time_us")?;

    let execution_time = u64::try_from(micros)
        .map(Duration::from_micros)
        .map_err(|_| PgError::row(format!("negative execution time for version {}", version)))?;

    Ok(MigrationRecord {
        version: Version::new(version),
        description,
        checksum,
        applied_at,
        execution_time,
    })
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn create_table(&self, table: &TableName) -> MigrateResult<()> {
        let client = self.pool.get().await?;
        let sql = create_table_sql(table);
        debug!(sql = %sql, "Ensuring ledger table");
        client.batch_execute(&sql).await.map_err(PgError::from)?;
        Ok(())
    }

    async fn query_all(&self, table: &TableName) -> MigrateResult<Vec<MigrationRecord>> {
        Ok(self.read_all(table).await?)
    }

    async fn begin<'a>(
        &'a self,
        mode: TransactionMode,
    ) -> MigrateResult<Box<dyn LedgerTransaction + 'a>> {
        let client = self.pool.get().await?;
        let open = mode == TransactionMode::PerMigration;
        if open {
            client.batch_execute("BEGIN").await.map_err(PgError::from)?;
        }
        Ok(Box::new(PgLedgerTransaction {
            client: Some(client),
            open,
        }))
    }
}

/// One migration's unit of work on a dedicated pooled connection.
///
/// With [`TransactionMode::None`] the connection stays in autocommit and
/// `commit`/`rollback` do nothing.
struct PgLedgerTransaction {
    client: Option<Object>,
    open: bool,
}

impl PgLedgerTransaction {
    fn client(&self) -> PgResult<&Object> {
        self.client
            .as_ref()
            .ok_or_else(|| PgError::config("transaction connection already released"))
    }

    async fn finish(&mut self, statement: &str) -> PgResult<()> {
        if !self.open {
            return Ok(());
        }
        self.client()?.batch_execute(statement).await?;
        self.open = false;
        Ok(())
    }
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn execute(&mut self, script: &str) -> MigrateResult<()> {
        self.client()?
            .batch_execute(script)
            .await
            .map_err(PgError::from)?;
        Ok(())
    }

    async fn insert_record(
        &mut self,
        table: &TableName,
        record: &MigrationRecord,
    ) -> MigrateResult<()> {
        let micros = i64::try_from(record.execution_time.as_micros()).unwrap_or(i64::MAX);
        let sql = insert_sql(table);
        debug!(sql = %sql, version = %record.version, "Recording migration");
        self.client()?
            .execute(
                sql.as_str(),
                &[
                    &record.version.as_f64(),
                    &record.description,
                    &record.checksum,
                    &record.applied_at,
                    &micros,
                ],
            )
            .await
            .map_err(PgError::from)?;
        Ok(())
    }

    async fn commit(&mut self) -> MigrateResult<()> {
        Ok(self.finish("COMMIT").await?)
    }

    async fn rollback(&mut self) -> MigrateResult<()> {
        Ok(self.finish("ROLLBACK").await?)
    }
}

impl Drop for PgLedgerTransaction {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        // Returning a connection mid-transaction would hand the open
        // transaction to the next user; close it instead so the server aborts it.
        if let Some(client) = self.client.take() {
            warn!("Transaction dropped while open, discarding connection");
            drop(Object::take(client));
        }
    }
}
