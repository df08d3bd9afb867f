//! Migration discovery and runner configuration.
//!
//! This crate locates migration scripts (a directory on disk, scripts
//! embedded in the binary, or a fallback chain of both) and loads the YAML
//! configuration that tells the runner where the database lives.
//!
//! # Quick start
//!
//! ```no_run
//! use sqlmigrate_source::{MigrateConfig, MigrationSet};
//!
//! let config = MigrateConfig::load("sqlmigrate.yml").unwrap();
//! let db_path = config.database.resolve_path().unwrap();
//!
//! let set = MigrationSet::from_dir(&config.migrations.dir).unwrap();
//! for file in set.iter() {
//!     println!("{} -> {}", file.file_name(), db_path.display());
//! }
//! ```

mod config;
mod error;
mod loader;

pub use config::{DatabaseConfig, JournalMode, MigrateConfig, MigrationsConfig, PragmaConfig};
pub use error::{Result, SourceError};
pub use loader::{EmbeddedScripts, MigrationSet, MigrationSetBuilder, MigrationSource};
