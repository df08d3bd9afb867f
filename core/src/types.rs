//! Migration file and version types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::script::{MigrationScript, ScriptError};

/// File extension recognized for migration scripts.
pub const MIGRATION_EXTENSION: &str = "sql";

/// Identifier correlating a migration file with its ledger row.
///
/// Derived from the file name with its `.sql` extension removed. Versions
/// order lexicographically, which is the order migrations are applied in.
///
/// # Examples
///
/// ```
/// use sqlmigrate_core::MigrationVersion;
///
/// let version = MigrationVersion::from_file_name("20240101120000_create_books.sql");
/// assert_eq!(version.as_str(), "20240101120000_create_books");
/// assert!(version < MigrationVersion::from_file_name("20240102000000_add_rating.sql"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationVersion(String);

impl MigrationVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Strips a trailing `.sql` extension (any case) from `file_name`.
    pub fn from_file_name(file_name: &str) -> Self {
        let stem = match file_name.rsplit_once('.') {
            Some((stem, ext)) if ext.eq_ignore_ascii_case(MIGRATION_EXTENSION) => stem,
            _ => file_name,
        };
        Self(stem.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One migration script as read from disk or embedded in the binary.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    file_name: String,
    version: MigrationVersion,
    content: String,
}

impl MigrationFile {
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let version = MigrationVersion::from_file_name(&file_name);
        Self {
            file_name,
            version,
            content: content.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn version(&self) -> &MigrationVersion {
        &self.version
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Parses the file's apply and revert sections.
    ///
    /// # Errors
    ///
    /// See [`MigrationScript::parse`].
    pub fn script(&self) -> Result<MigrationScript, ScriptError> {
        MigrationScript::parse(&self.content)
    }
}
