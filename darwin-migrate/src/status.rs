//! Per-migration status for reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::MigrationRecord;
use crate::migration::Migration;
use crate::plan::watermark;

/// Status of a declared migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MigrationStatus {
    /// Below the watermark but never applied; it will not be planned.
    Ignored,
    /// Recorded in the ledger.
    Applied,
    /// Above the watermark, waiting to be applied.
    Pending,
    /// Failed to apply. Not produced by [`resolve_status`].
    Error,
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignored => write!(f, "IGNORED"),
            Self::Applied => write!(f, "APPLIED"),
            Self::Pending => write!(f, "PENDING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A declared migration together with its resolved status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationInfo {
    /// Resolved status.
    pub status: MigrationStatus,
    /// Failure detail; always `None` for now.
    pub error: Option<String>,
    /// The declared migration.
    pub migration: Migration,
}

/// Resolve the status of one declared migration against the ledger.
pub fn resolve_status(applied: &[MigrationRecord], migration: &Migration) -> MigrationStatus {
    let Some(last) = watermark(applied) else {
        return MigrationStatus::Pending;
    };

    if migration.version > last {
        return MigrationStatus::Pending;
    }

    if applied.iter().any(|r| r.version == migration.version) {
        MigrationStatus::Applied
    } else {
        MigrationStatus::Ignored
    }
}

/// Resolve every declared migration, keeping declared order.
pub fn resolve_all(applied: &[MigrationRecord], declared: &[Migration]) -> Vec<MigrationInfo> {
    declared
        .iter()
        .map(|migration| MigrationInfo {
            status: resolve_status(applied, migration),
            error: None,
            migration: migration.clone(),
        })
        .collect()
}
