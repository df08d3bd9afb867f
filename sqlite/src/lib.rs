//! Transactional SQLite migration runner.
//!
//! Applies the migration scripts of a [`MigrationSet`](sqlmigrate_source::MigrationSet)
//! to a SQLite database, recording each applied version in the
//! `schema_migrations` ledger table.
//!
//! # Architecture
//!
//! - **`ledger`**: the `schema_migrations` table (create, read, record)
//! - **`guard`**: skips `ALTER TABLE .. ADD COLUMN` for columns that already exist
//! - **`migrator`**: per-migration transactions, run reports and status
//! - **`connection`**: opening a database with configured pragmas
//!
//! # Guarantees
//!
//! - Each migration and its ledger row commit together or not at all.
//! - Migrations run in ascending file-name order; a failure stops the run
//!   and leaves earlier migrations applied.
//! - Re-running against an up-to-date database changes nothing.
//!
//! # Quick start
//!
//! ```no_run
//! use rusqlite::Connection;
//! use sqlmigrate_sqlite::run_migrations;
//!
//! let mut conn = Connection::open("app.db").unwrap();
//! let report = run_migrations(&mut conn, "db/migrations").unwrap();
//!
//! for applied in &report.applied {
//!     println!("applied {}", applied.version);
//! }
//! ```

mod connection;
mod error;
mod guard;
mod ledger;
mod migrator;

pub use connection::{apply_pragmas, open_database};
pub use error::{MigrateError, Result};
pub use guard::{SchemaInspector, should_skip};
pub use ledger::{LEDGER_TABLE, Ledger, LedgerEntry};
pub use migrator::{AppliedMigration, MigrationReport, MigrationStatus, Migrator, run_migrations};
