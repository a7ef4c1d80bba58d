//! Validation of the declared migrations against the ledger.

use std::collections::{HashMap, HashSet};

use crate::error::{MigrateResult, MigrationError};
use crate::ledger::MigrationRecord;
use crate::migration::{Migration, Version};

/// Check the declared migrations and detect drift against applied ones.
///
/// Checks run in this order and the first failure is returned:
///
/// 1. every version is finite and not negative;
/// 2. no two migrations share a version;
/// 3. every applied version is still declared;
/// 4. every applied script still has the checksum it was applied with.
pub fn validate(declared: &[Migration], applied: &[MigrationRecord]) -> MigrateResult<()> {
    validate_versions(declared)?;
    validate_duplicates(declared)?;

    let removed = removed_migrations(applied, declared);
    if !removed.is_empty() {
        return Err(MigrationError::RemovedMigrations(removed));
    }

    compare_checksums(applied, declared)
}

fn validate_versions(declared: &[Migration]) -> MigrateResult<()> {
    match declared.iter().find(|m| !m.version.is_legal()) {
        Some(m) => Err(MigrationError::IllegalVersion(m.version)),
        None => Ok(()),
    }
}

fn validate_duplicates(declared: &[Migration]) -> MigrateResult<()> {
    let mut seen = HashSet::with_capacity(declared.len());
    for migration in declared {
        if !seen.insert(migration.version) {
            return Err(MigrationError::DuplicateVersion(migration.version));
        }
    }
    Ok(())
}

/// Applied versions with no declared counterpart, in ledger order.
pub fn removed_migrations(applied: &[MigrationRecord], declared: &[Migration]) -> Vec<Version> {
    let declared: HashSet<Version> = declared.iter().map(|m| m.version).collect();
    applied
        .iter()
        .map(|r| r.version)
        .filter(|v| !declared.contains(v))
        .collect()
}

fn compare_checksums(applied: &[MigrationRecord], declared: &[Migration]) -> MigrateResult<()> {
    let by_version: HashMap<Version, &MigrationRecord> =
        applied.iter().map(|r| (r.version, r)).collect();

    for migration in declared {
        let Some(record) = by_version.get(&migration.version) else {
            continue;
        };
        // CHARACTER(n) columns come back blank padded.
        let expected = record.checksum.trim_end();
        let actual = migration.checksum();
        if expected != actual {
            return Err(MigrationError::InvalidChecksum {
                version: migration.version,
                expected: expected.to_string(),
                actual,
            });
        }
    }
    Ok(())
}
