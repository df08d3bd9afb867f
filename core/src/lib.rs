//! Text-level building blocks for SQLite schema migrations.
//!
//! This crate has no database dependency. It provides:
//!
//! - [`remove_comments`] / [`split_statements`]: quote-aware lexing of
//!   multi-statement SQL.
//! - [`MigrationScript`] / [`extract_apply_section`]: the
//!   `-- migrate:up` / `-- migrate:down` file format.
//! - [`parse_add_column`] / [`is_valid_identifier`]: recognition of the one
//!   DDL shape the migrator inspects before executing.
//! - [`MigrationFile`] / [`MigrationVersion`]: migration identity.
//! - [`validate_migrations`]: set-level invariants such as unique versions.
//!
//! # Example
//!
//! ```
//! use sqlmigrate_core::*;
//!
//! let file = MigrationFile::new(
//!     "20240101000000_books.sql",
//!     "-- migrate:up\n\
//!      CREATE TABLE books (title TEXT DEFAULT 'n/a; none'); -- table\n\
//!      ALTER TABLE books ADD COLUMN rating REAL;\n\
//!      -- migrate:down\n\
//!      DROP TABLE books;\n",
//! );
//!
//! let statements = file.script().unwrap().statements();
//! assert_eq!(statements.len(), 2);
//! assert!(parse_add_column(&statements[1]).is_some());
//! assert!(validate_migrations(&[file]).is_empty());
//! ```

mod ddl;
mod lexer;
mod script;
mod types;
mod validate;

pub use ddl::{AddColumn, is_valid_identifier, parse_add_column};
pub use lexer::{executable_statements, remove_comments, split_statements};
pub use script::{APPLY_MARKER, MigrationScript, REVERT_MARKER, ScriptError, extract_apply_section};
pub use types::{MIGRATION_EXTENSION, MigrationFile, MigrationVersion};
pub use validate::{ValidationError, validate_migrations};
