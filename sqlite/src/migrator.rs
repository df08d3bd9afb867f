//! Applying migration sets to a SQLite database.
//!
//! Provides [`Migrator`], which walks a [`MigrationSet`] in version order and
//! applies every script the ledger has not recorded yet. Each migration runs
//! in its own transaction together with its ledger row, so a migration is
//! either fully applied and recorded or leaves no trace.
//!
//! # Example
//!
//! ```no_run
//! use rusqlite::Connection;
//! use sqlmigrate_source::MigrationSet;
//! use sqlmigrate_sqlite::Migrator;
//!
//! let mut conn = Connection::open("app.db").unwrap();
//! let set = MigrationSet::from_dir("db/migrations").unwrap();
//!
//! let report = Migrator::new(&mut conn).run(&set).unwrap();
//! println!("Applied {} migrations", report.applied.len());
//!
//! let status = Migrator::new(&mut conn).status(&set).unwrap();
//! assert!(status.is_up_to_date());
//! ```

use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;
use sqlmigrate_core::{MigrationFile, MigrationVersion};
use sqlmigrate_source::MigrationSet;
use tracing::{debug, info, warn};

use crate::error::{MigrateError, Result};
use crate::guard::should_skip;
use crate::ledger::{Ledger, LedgerEntry};

/// Applies pending migrations and reports ledger state.
///
/// Borrows the connection mutably because every migration opens its own
/// transaction on it.
pub struct Migrator<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> Migrator<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Applies every migration of `set` that has no ledger row, in order.
    ///
    /// Stops at the first failure. Migrations applied before the failure
    /// stay applied and recorded; the failing one is rolled back.
    ///
    /// # Errors
    ///
    /// - [`MigrateError::LedgerError`] if the ledger cannot be created or read
    /// - [`MigrateError::FormatError`] if a pending script has no apply section
    /// - [`MigrateError::ExecutionError`] if a statement fails
    /// - [`MigrateError::RecordError`] if the ledger row cannot be inserted
    /// - [`MigrateError::BeginError`] or [`MigrateError::CommitError`] for
    ///   transaction failures
    pub fn run(&mut self, set: &MigrationSet) -> Result<MigrationReport> {
        Ledger::new(&*self.conn)
            .ensure_table()
            .map_err(|source| MigrateError::LedgerError {
                operation: "create ledger table",
                source,
            })?;

        let mut report = MigrationReport::default();
        for file in set.iter() {
            let recorded = Ledger::new(&*self.conn)
                .contains(file.version())
                .map_err(|source| MigrateError::LedgerError {
                    operation: "look up applied version",
                    source,
                })?;
            if recorded {
                debug!(version = %file.version(), "Migration already applied");
                report.already_applied.push(file.version().clone());
                continue;
            }

            let script = file.script().map_err(|source| MigrateError::FormatError {
                version: file.version().clone(),
                file_name: file.file_name().to_string(),
                source,
            })?;
            let applied = self.apply(file, &script.statements())?;
            info!(
                version = %applied.version,
                executed = applied.statements_executed,
                skipped = applied.statements_skipped,
                "Migration applied"
            );
            report.applied.push(applied);
        }

        Ok(report)
    }

    /// Compares `set` with the ledger without applying anything.
    ///
    /// Creates the ledger table if it does not exist yet.
    pub fn status(&self, set: &MigrationSet) -> Result<MigrationStatus> {
        let ledger = Ledger::new(&*self.conn);
        ledger.ensure_table().map_err(|source| MigrateError::LedgerError {
            operation: "create ledger table",
            source,
        })?;
        let entries = ledger.entries().map_err(|source| MigrateError::LedgerError {
            operation: "read ledger entries",
            source,
        })?;

        let pending = set
            .iter()
            .map(MigrationFile::version)
            .filter(|version| !entries.iter().any(|entry| &entry.version == *version))
            .cloned()
            .collect();
        let (applied, orphaned): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| set.get(&entry.version).is_some());

        Ok(MigrationStatus {
            applied,
            pending,
            orphaned: orphaned.into_iter().map(|entry| entry.version).collect(),
        })
    }

    /// Runs one migration and its ledger insert in a single transaction.
    fn apply(&mut self, file: &MigrationFile, statements: &[String]) -> Result<AppliedMigration> {
        let tx = self.conn.transaction().map_err(|source| MigrateError::BeginError {
            version: file.version().clone(),
            file_name: file.file_name().to_string(),
            source,
        })?;

        match execute_statements(&tx, file, statements) {
            Ok(applied) => {
                tx.commit().map_err(|source| MigrateError::CommitError {
                    version: file.version().clone(),
                    file_name: file.file_name().to_string(),
                    source,
                })?;
                Ok(applied)
            }
            Err(err) => {
                debug!(version = %file.version(), error = %err, "Rolling back migration");
                match tx.rollback() {
                    Ok(()) => Err(err),
                    Err(source) => Err(MigrateError::RollbackError {
                        cause: Box::new(err),
                        source,
                    }),
                }
            }
        }
    }
}

fn execute_statements(
    conn: &Connection,
    file: &MigrationFile,
    statements: &[String],
) -> Result<AppliedMigration> {
    let mut applied = AppliedMigration {
        version: file.version().clone(),
        file_name: file.file_name().to_string(),
        statements_executed: 0,
        statements_skipped: 0,
    };

    for (index, statement) in statements.iter().enumerate() {
        if should_skip(statement, conn) {
            warn!(
                version = %file.version(),
                statement = index + 1,
                "Skipping statement, column already exists"
            );
            applied.statements_skipped += 1;
            continue;
        }

        debug!(version = %file.version(), statement = index + 1, "Executing statement");
        conn.execute_batch(statement)
            .map_err(|source| MigrateError::ExecutionError {
                version: file.version().clone(),
                file_name: file.file_name().to_string(),
                statement: index + 1,
                source,
            })?;
        applied.statements_executed += 1;
    }

    Ledger::new(conn)
        .record(file.version())
        .map_err(|source| MigrateError::RecordError {
            version: file.version().clone(),
            file_name: file.file_name().to_string(),
            source,
        })?;

    Ok(applied)
}

/// Discovers the scripts in `dir` and applies the pending ones.
///
/// Succeeds only once every discovered migration has a ledger row.
pub fn run_migrations(conn: &mut Connection, dir: impl AsRef<Path>) -> Result<MigrationReport> {
    let set = MigrationSet::from_dir(dir)?;
    Migrator::new(conn).run(&set)
}

/// Outcome of [`Migrator::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Migrations applied by this run, in order.
    pub applied: Vec<AppliedMigration>,
    /// Versions that already had a ledger row.
    pub already_applied: Vec<MigrationVersion>,
}

impl MigrationReport {
    /// Returns `true` if the run applied nothing.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// A migration applied during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub version: MigrationVersion,
    pub file_name: String,
    pub statements_executed: usize,
    /// Statements the column guard found redundant.
    pub statements_skipped: usize,
}

/// Ledger state relative to a migration set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Recorded migrations that have a script in the set.
    pub applied: Vec<LedgerEntry>,
    /// Scripts with no ledger row, in execution order.
    pub pending: Vec<MigrationVersion>,
    /// Recorded versions with no script in the set.
    pub orphaned: Vec<MigrationVersion>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}
