//! # darwin-migrate
//!
//! Forward-only migration engine for SQL databases.
//!
//! This crate provides functionality for:
//! - Parsing a single migration document into versioned migrations
//! - Validating declared migrations against what the database has applied
//! - Planning which migrations still need to run
//! - Applying each migration together with its ledger entry
//! - Reporting the status of every declared migration
//!
//! ## Architecture
//!
//! Applied migrations are tracked in a ledger table (`migration` by default).
//! Every run reads the ledger, validates the declared set against it, plans
//! the pending migrations and applies them one by one.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ migrations   │────▶│ Parser         │────▶│ Validator   │
//! │ .sql         │     └────────────────┘     └─────────────┘
//! └──────────────┘                                   │
//!                                                    ▼
//!                      ┌────────────────┐     ┌─────────────┐
//!                      │ Applier        │◀────│ Planner     │
//!                      └────────────────┘     └─────────────┘
//!                              │
//!                              ▼
//!                      ┌────────────────┐
//!                      │ Ledger table   │
//!                      └────────────────┘
//! ```
//!
//! ## Migration Document
//!
//! A document is a sequence of segments, each introduced by a header line:
//!
//! ```text
//! ---- 1.0 Create users
//! CREATE TABLE users (id SERIAL PRIMARY KEY);
//!
//! ---- 1.1 Add email
//! ALTER TABLE users ADD COLUMN email TEXT;
//! ```
//!
//! Versions are decimal numbers. Scripts are opaque and sent to the database
//! as a single batch.
//!
//! ## Example
//!
//! ```rust,ignore
//! use darwin_migrate::{parse_file, Migrator};
//!
//! async fn run(store: impl darwin_migrate::LedgerStore) -> darwin_migrate::MigrateResult<()> {
//!     let migrations = parse_file("migrations.sql").await?;
//!     let migrator = Migrator::builder(store).migrations(migrations).build();
//!
//!     let report = migrator.migrate().await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Testing
//!
//! [`MemoryLedger`] implements [`LedgerStore`] in process memory, with
//! injectable faults for exercising rollback paths.

pub mod apply;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod migration;
pub mod parse;
pub mod plan;
pub mod sql;
pub mod status;
pub mod validate;

// Re-exports
pub use apply::apply;
pub use engine::{MigrationConfig, MigrationReport, Migrator, MigratorBuilder};
pub use error::{ApplyPhase, MigrateResult, MigrationError, ParseError};
pub use ledger::{LedgerStore, LedgerTransaction, MigrationRecord, TransactionMode};
pub use memory::MemoryLedger;
pub use migration::{Migration, Version, compute_checksum};
pub use parse::{parse_file, parse_reader, parse_str, render};
pub use plan::{plan, watermark};
pub use sql::{DEFAULT_TABLE_NAME, TableName};
pub use status::{MigrationInfo, MigrationStatus, resolve_all, resolve_status};
pub use validate::{removed_migrations, validate};
