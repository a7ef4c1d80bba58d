//! Error types for the migration engine.

use std::fmt;

use thiserror::Error;

use crate::migration::Version;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors raised while reading a migration document.
///
/// Every variant carries the zero-based index of the segment that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Script lines without a preceding header.
    #[error("invalid migration segment: header missing (segment {segment})")]
    MissingHeader {
        /// Segment index.
        segment: usize,
    },

    /// Header with fewer than three tokens.
    #[error(
        "invalid header (expected: '<marker> <version> <description>'): got {header:?} (segment {segment})"
    )]
    InvalidHeader {
        /// The offending header line, trimmed.
        header: String,
        /// Segment index.
        segment: usize,
    },

    /// Header whose description is blank.
    #[error("empty description (segment {segment})")]
    EmptyDescription {
        /// Segment index.
        segment: usize,
    },

    /// Version token is not a finite decimal number.
    #[error("invalid version (finite decimal number required): {reason} (segment {segment})")]
    InvalidVersion {
        /// Why the token was rejected.
        reason: String,
        /// Segment index.
        segment: usize,
    },

    /// Segment has no script once blank lines are trimmed.
    #[error("empty script (segment {segment})")]
    EmptyScript {
        /// Segment index.
        segment: usize,
    },
}

impl ParseError {
    /// Index of the segment that failed to parse.
    pub fn segment(&self) -> usize {
        match self {
            Self::MissingHeader { segment }
            | Self::InvalidHeader { segment, .. }
            | Self::EmptyDescription { segment }
            | Self::InvalidVersion { segment, .. }
            | Self::EmptyScript { segment } => *segment,
        }
    }
}

/// Step of the apply loop in which a migration failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyPhase {
    /// Opening the transaction.
    Begin,
    /// Running the migration script.
    Execute,
    /// Writing the ledger entry.
    RecordInsert,
    /// Committing the transaction.
    Commit,
}

impl fmt::Display for ApplyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => write!(f, "during transaction begin"),
            Self::Execute => write!(f, "during script execution"),
            Self::RecordInsert => write!(f, "during record insert"),
            Self::Commit => write!(f, "during commit"),
        }
    }
}

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Malformed migration document.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A declared migration has a negative or non-finite version.
    #[error("Illegal migration version number {0}")]
    IllegalVersion(Version),

    /// Two declared migrations share a version.
    #[error("Multiple migrations have the version number {0}")]
    DuplicateVersion(Version),

    /// Applied migrations are missing from the declared set.
    #[error("Migrations {} were removed", join_versions(.0))]
    RemovedMigrations(Vec<Version>),

    /// A declared script no longer matches what was applied.
    #[error("Invalid checksum for migration {version}: expected {expected}, got {actual}")]
    InvalidChecksum {
        /// Migration version.
        version: Version,
        /// Checksum stored in the ledger.
        expected: String,
        /// Checksum of the declared script.
        actual: String,
    },

    /// A migration failed and its transaction was rolled back.
    #[error("Migration {version} failed {phase}: {message}")]
    Apply {
        /// Migration version.
        version: Version,
        /// Where the failure happened.
        phase: ApplyPhase,
        /// Underlying store error.
        message: String,
    },

    /// A migration failed and rolling its transaction back failed as well.
    #[error("Migration {version} failed {phase}: {message}; rollback failed: {rollback}")]
    RollbackFailed {
        /// Migration version.
        version: Version,
        /// Where the original failure happened.
        phase: ApplyPhase,
        /// Underlying store error.
        message: String,
        /// Error raised by the rollback attempt.
        rollback: String,
    },

    /// Configured ledger table name contains forbidden characters.
    #[error("Invalid table name {0:?}: expected a letter or underscore followed by [A-Za-z0-9_]")]
    InvalidTableName(String),

    /// Database operation error.
    #[error("Database error: {0}")]
    Database(String),
}

impl MigrationError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create an apply error for a migration.
    pub fn apply(version: Version, phase: ApplyPhase, msg: impl Into<String>) -> Self {
        Self::Apply {
            version,
            phase,
            message: msg.into(),
        }
    }

    /// Check if this error came from validating the declared set.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::IllegalVersion(_)
                | Self::DuplicateVersion(_)
                | Self::RemovedMigrations(_)
                | Self::InvalidChecksum { .. }
        )
    }

    /// Check if the store may be left with an open transaction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }

    /// The migration version the error refers to, if any.
    pub fn version(&self) -> Option<Version> {
        match self {
            Self::IllegalVersion(v) | Self::DuplicateVersion(v) => Some(*v),
            Self::InvalidChecksum { version, .. }
            | Self::Apply { version, .. }
            | Self::RollbackFailed { version, .. } => Some(*version),
            _ => None,
        }
    }
}

fn join_versions(versions: &[Version]) -> String {
    versions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
