//! Migration runner configuration.
//!
//! Defines the YAML-serializable configuration naming where the database
//! lives, where migration scripts are found, and which connection pragmas to
//! apply. Every section is optional.
//!
//! # Example YAML
//!
//! ```yaml
//! database:
//!   candidates:
//!     - /data/bookscraping.db
//!     - ./db/bookscraping.db
//! migrations:
//!   dir: db/migrations
//! pragmas:
//!   foreign_keys: true
//!   journal_mode: wal
//! ```

use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SourceError};

/// Candidate database locations, most preferred first.
///
/// The first candidate whose parent directory already exists is chosen, so a
/// mounted volume such as `/data` wins when present and a local path is used
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub candidates: Vec<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            candidates: vec![
                PathBuf::from("/data/sqlmigrate.db"),
                PathBuf::from("db/sqlmigrate.db"),
            ],
        }
    }
}

impl DatabaseConfig {
    /// Uses exactly one database path.
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec![path.into()],
        }
    }

    /// Picks the database path and makes sure its parent directory exists.
    ///
    /// Returns the first candidate whose parent directory exists, or the last
    /// candidate when none does. The chosen path's parent directory is
    /// created if missing.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidConfig`] when there are no candidates, or
    /// [`SourceError::IoError`] when the parent directory cannot be created.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        let Some(fallback) = self.candidates.last() else {
            return Err(SourceError::InvalidConfig(
                "database.candidates must name at least one path".to_string(),
            ));
        };

        let chosen = self
            .candidates
            .iter()
            .find(|candidate| parent_dir(candidate).is_dir())
            .unwrap_or(fallback);

        let parent = parent_dir(chosen);
        if !parent.is_dir() {
            std::fs::create_dir_all(parent)?;
        }

        debug!(path = %chosen.display(), "Resolved database path");
        Ok(chosen.clone())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Where migration scripts are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    pub dir: PathBuf,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("db/migrations"),
        }
    }
}

/// SQLite journal modes accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    /// Keyword used in `PRAGMA journal_mode = ...`.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }
}

/// Pragmas applied when a connection is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PragmaConfig {
    /// Enforce foreign key constraints.
    pub foreign_keys: bool,
    /// Journal mode; the SQLite default is kept when unset.
    pub journal_mode: Option<JournalMode>,
}

impl Default for PragmaConfig {
    fn default() -> Self {
        Self {
            foreign_keys: true,
            journal_mode: None,
        }
    }
}

/// Top-level migration runner configuration.
///
/// Loaded from a YAML file (typically `sqlmigrate.yml`). Command-line flags
/// take precedence over values read here.
///
/// # Examples
///
/// ```
/// use sqlmigrate_source::MigrateConfig;
///
/// let config: MigrateConfig = serde_yaml::from_str("migrations:\n  dir: sql\n").unwrap();
/// assert_eq!(config.migrations.dir, std::path::PathBuf::from("sql"));
/// assert!(config.pragmas.foreign_keys);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    pub database: DatabaseConfig,
    pub migrations: MigrationsConfig,
    pub pragmas: PragmaConfig,
}

impl MigrateConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SourceError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::SourceError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
database:
  candidates:
    - /data/books.db
    - ./db/books.db
migrations:
  dir: db/migrations
pragmas:
  foreign_keys: false
  journal_mode: wal
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: MigrateConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(
            config.database.candidates,
            vec![PathBuf::from("/data/books.db"), PathBuf::from("./db/books.db")]
        );
        assert_eq!(config.migrations.dir, PathBuf::from("db/migrations"));
        assert!(!config.pragmas.foreign_keys);
        assert_eq!(config.pragmas.journal_mode, Some(JournalMode::Wal));
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: MigrateConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, MigrateConfig::default());
        assert!(config.pragmas.foreign_keys);
        assert_eq!(config.pragmas.journal_mode, None);
    }

    #[test]
    fn test_rejects_unknown_journal_mode() {
        let result: std::result::Result<MigrateConfig, _> =
            serde_yaml::from_str("pragmas:\n  journal_mode: fast\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlmigrate.yml");
        std::fs::write(&path, sample_yaml()).unwrap();

        let expected: MigrateConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(MigrateConfig::load(&path).unwrap(), expected);
    }

    #[test]
    fn test_load_missing_file() {
        let err = MigrateConfig::load("/nonexistent/sqlmigrate.yml").unwrap_err();
        assert!(matches!(err, SourceError::IoError(_)));
    }

    #[test]
    fn test_resolve_path_prefers_existing_parent() {
        let mounted = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            candidates: vec![
                mounted.path().join("app.db"),
                local.path().join("db/app.db"),
            ],
        };

        assert_eq!(config.resolve_path().unwrap(), mounted.path().join("app.db"));
        assert!(!local.path().join("db").exists());
    }

    #[test]
    fn test_resolve_path_falls_back_and_creates_parent() {
        let local = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            candidates: vec![
                PathBuf::from("/nonexistent/sqlmigrate/app.db"),
                local.path().join("db/app.db"),
            ],
        };

        let path = config.resolve_path().unwrap();
        assert_eq!(path, local.path().join("db/app.db"));
        assert!(local.path().join("db").is_dir());
    }

    #[test]
    fn test_resolve_path_requires_candidates() {
        let config = DatabaseConfig { candidates: vec![] };
        assert!(matches!(
            config.resolve_path(),
            Err(SourceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_journal_mode_sql_keyword() {
        assert_eq!(JournalMode::Wal.as_sql(), "WAL");
        assert_eq!(JournalMode::Delete.as_sql(), "DELETE");
    }
}
