//! # Darwin
//!
//! Versioned, forward-only SQL migrations for PostgreSQL.
//!
//! Darwin provides:
//! - A plain-text migration document format, one file for every migration
//! - Validation of declared migrations against what the database applied
//! - Transactional application, one migration per transaction
//! - A PostgreSQL ledger store with connection pooling
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use darwin::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = PgPool::from_url("postgresql://localhost/mydb")?;
//!     let migrator = Migrator::builder(PgLedger::new(pool))
//!         .migrations(parse_file("migrations.sql").await?)
//!         .build();
//!
//!     migrator.migrate().await?;
//!     for info in migrator.info().await? {
//!         println!("{} {}", info.status, info.migration.version);
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Migration parsing, validation, planning and application.
pub mod migrate {
    pub use darwin_migrate::*;
}

/// PostgreSQL ledger store.
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres {
    pub use darwin_postgres::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        LedgerStore, MemoryLedger, MigrateResult, Migration, MigrationError, MigrationInfo,
        MigrationRecord, MigrationStatus, Migrator, Version, parse_file, parse_str,
    };
    #[cfg(feature = "postgres")]
    pub use crate::postgres::{PgConfig, PgLedger, PgPool};
}

// Re-export key types at the crate root
pub use migrate::{MigrateResult, MigrationError, Migrator};
