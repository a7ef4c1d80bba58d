//! Migration definitions.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A migration version number.
///
/// Versions are plain decimals (`1`, `1.5`, `20240101.1`). `-0.0` is stored
/// as `0.0`, and comparisons use a total order so versions can be sorted and
/// used as map keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Version(f64);

impl Version {
    /// Create a version, normalizing negative zero.
    pub fn new(value: f64) -> Self {
        if value == 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    /// The raw numeric value.
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Whether the version can be applied at all (finite and not negative).
    pub fn is_legal(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }
}

impl From<f64> for Version {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Version> for f64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.0.to_string();
        if self.0.is_finite() && !text.contains('.') {
            write!(f, "{}.0", text)
        } else {
            f.write_str(&text)
        }
    }
}

/// A declared database migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// Version; identifies the migration and orders it.
    pub version: Version,
    /// Human readable description.
    pub description: String,
    /// SQL executed verbatim when the migration is applied.
    pub script: String,
}

impl Migration {
    /// Create a new migration.
    pub fn new(
        version: impl Into<Version>,
        description: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            description: description.into(),
            script: script.into(),
        }
    }

    /// SHA-256 of the script, hex encoded.
    pub fn checksum(&self) -> String {
        compute_checksum(&self.script)
    }
}

/// Compute a SHA256 checksum of the content.
pub fn compute_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
