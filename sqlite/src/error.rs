//! Error types for SQLite migration runs.
//!
//! Every error raised while a specific migration is being handled carries
//! that migration's version and file name.

use sqlmigrate_core::{MigrationVersion, ScriptError};
use sqlmigrate_source::SourceError;
use thiserror::Error;

/// Errors that can occur while migrating a SQLite database.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// SQLite operation failure outside any single migration.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// File I/O failure while opening the database.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Migration scripts could not be located, read, or validated.
    #[error("discovery error: {0}")]
    DiscoveryError(#[from] SourceError),

    /// The `schema_migrations` table could not be created or read.
    #[error("ledger error: failed to {operation}: {source}")]
    LedgerError {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A migration file has no usable apply section.
    #[error("migration {version} ({file_name}) is malformed: {source}")]
    FormatError {
        version: MigrationVersion,
        file_name: String,
        #[source]
        source: ScriptError,
    },

    /// The transaction for a migration could not be opened.
    #[error("failed to begin transaction for migration {version} ({file_name}): {source}")]
    BeginError {
        version: MigrationVersion,
        file_name: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement of a migration failed; the migration was rolled back.
    #[error("failed to execute migration {version} ({file_name}) at statement {statement}: {source}")]
    ExecutionError {
        version: MigrationVersion,
        file_name: String,
        /// One-based position of the failing statement in the apply section.
        statement: usize,
        #[source]
        source: rusqlite::Error,
    },

    /// The ledger row for a migration could not be inserted; the migration
    /// was rolled back.
    #[error("failed to record migration {version} ({file_name}): {source}")]
    RecordError {
        version: MigrationVersion,
        file_name: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The migration transaction failed to commit.
    #[error("failed to commit migration {version} ({file_name}): {source}")]
    CommitError {
        version: MigrationVersion,
        file_name: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Rolling back after a failure also failed.
    #[error("{cause} (rollback error: {source})")]
    RollbackError {
        cause: Box<MigrateError>,
        #[source]
        source: rusqlite::Error,
    },
}

impl MigrateError {
    /// Version of the migration this error is about, if any.
    pub fn version(&self) -> Option<&MigrationVersion> {
        match self {
            Self::FormatError { version, .. }
            | Self::BeginError { version, .. }
            | Self::ExecutionError { version, .. }
            | Self::RecordError { version, .. }
            | Self::CommitError { version, .. } => Some(version),
            Self::RollbackError { cause, .. } => cause.version(),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`MigrateError`].
pub type Result<T> = std::result::Result<T, MigrateError>;
