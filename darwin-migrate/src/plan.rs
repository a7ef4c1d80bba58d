//! Planning which migrations to apply.
//!
//! Planning is watermark based: everything declared above the highest applied
//! version is pending. A declared version below the watermark that has no
//! ledger entry (a gap) is never planned. Tools that diff the declared set
//! against the ledger would apply it; this engine keeps the watermark policy
//! for compatibility with existing ledgers.

use crate::ledger::MigrationRecord;
use crate::migration::{Migration, Version};

/// Highest applied version, or `None` when nothing has been applied.
pub fn watermark(applied: &[MigrationRecord]) -> Option<Version> {
    applied.iter().map(|r| r.version).max()
}

/// Declared migrations newer than the watermark, sorted by version.
pub fn plan(applied: &[MigrationRecord], declared: &[Migration]) -> Vec<Migration> {
    let last = watermark(applied);

    let mut planned: Vec<Migration> = declared
        .iter()
        .filter(|m| last.is_none_or(|w| m.version > w))
        .cloned()
        .collect();

    // Stable, so equal versions keep their declared order.
    planned.sort_by(|a, b| a.version.cmp(&b.version));
    planned
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;

    fn m(version: f64) -> Migration {
        Migration::new(version, format!("v{version}"), format!("SELECT {version};"))
    }

    fn applied(versions: &[f64]) -> Vec<MigrationRecord> {
        versions
            .iter()
            .map(|&v| MigrationRecord::for_migration(&m(v), Utc::now(), Duration::ZERO))
            .collect()
    }

    fn versions(planned: &[Migration]) -> Vec<f64> {
        planned.iter().map(|m| m.version.as_f64()).collect()
    }

    #[test]
    fn test_watermark() {
        assert_eq!(watermark(&[]), None);
        assert_eq!(watermark(&applied(&[1.0, 3.0, 2.0])), Some(Version::new(3.0)));
    }

    #[test]
    fn test_empty_ledger_plans_everything_sorted() {
        let declared = vec![m(2.0), m(0.0), m(1.5)];
        assert_eq!(versions(&plan(&[], &declared)), vec![0.0, 1.5, 2.0]);
    }

    #[test]
    fn test_plans_above_watermark() {
        let declared = vec![m(1.0), m(1.5), m(2.0)];
        assert_eq!(versions(&plan(&applied(&[1.0]), &declared)), vec![1.5, 2.0]);
    }

    #[test]
    fn test_gap_below_watermark_is_skipped() {
        let declared = vec![m(1.0), m(2.0), m(3.0), m(4.0)];
        assert_eq!(versions(&plan(&applied(&[1.0, 3.0]), &declared)), vec![4.0]);
    }

    #[test]
    fn test_nothing_pending() {
        let declared = vec![m(1.0), m(2.0)];
        assert!(plan(&applied(&[1.0, 2.0]), &declared).is_empty());
    }

    #[test]
    fn test_output_strictly_ascending() {
        let declared: Vec<_> = [9.0, 0.5, 7.25, 3.0, 11.0, 4.5].into_iter().map(m).collect();
        let planned = plan(&applied(&[0.5]), &declared);
        assert!(planned.windows(2).all(|w| w[0].version < w[1].version));
        assert_eq!(planned.len(), 5);
    }

    #[test]
    fn test_ties_keep_declared_order() {
        let first = Migration::new(2.0, "first", "SELECT 1;");
        let second = Migration::new(2.0, "second", "SELECT 2;");
        let planned = plan(&[], &[second.clone(), m(1.0), first.clone()]);
        assert_eq!(planned[1], second);
        assert_eq!(planned[2], first);
    }
}
