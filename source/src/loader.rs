//! Migration discovery with builder pattern and fallback chains.
//!
//! Provides [`MigrationSet`], the ordered and validated list of migration
//! files a run works from, and [`MigrationSetBuilder`] for trying several
//! locations in turn.
//!
//! # Loading patterns
//!
//! ```no_run
//! use sqlmigrate_source::MigrationSet;
//!
//! // Load every `*.sql` file in a directory
//! let set = MigrationSet::from_dir("db/migrations").unwrap();
//!
//! // Scripts compiled into the binary
//! static EMBEDDED: &[(&str, &str)] = &[
//!     ("001_books.sql", "-- migrate:up\nCREATE TABLE books (id INTEGER);"),
//! ];
//! let set = MigrationSet::from_embedded(EMBEDDED).unwrap();
//!
//! // Prefer the directory, fall back to the embedded copy
//! let set = MigrationSet::builder()
//!     .from_dir("db/migrations")
//!     .with_embedded(EMBEDDED)
//!     .build()
//!     .unwrap();
//! ```
//!
//! Files are always ordered by file name, and a set that fails
//! [`validate_migrations`] is rejected as a whole.

use std::path::{Path, PathBuf};

use sqlmigrate_core::{MIGRATION_EXTENSION, MigrationFile, MigrationVersion, validate_migrations};
use tracing::debug;

use crate::error::{Result, SourceError};

/// Scripts embedded at compile time as `(file name, content)` pairs.
pub type EmbeddedScripts = &'static [(&'static str, &'static str)];

/// Describes where a [`MigrationSet`] was loaded from.
#[derive(Debug, Clone)]
pub enum MigrationSource {
    /// A directory of `*.sql` files.
    Directory(PathBuf),
    /// Scripts compiled into the binary.
    Embedded,
}

/// Ordered, validated migration files.
///
/// Files are sorted by file name, which is the order they are applied in.
/// No two files share a version.
#[derive(Debug, Clone)]
pub struct MigrationSet {
    files: Vec<MigrationFile>,
    source: MigrationSource,
}

impl MigrationSet {
    /// Returns a new [`MigrationSetBuilder`] for configuring a fallback chain.
    pub fn builder() -> MigrationSetBuilder {
        MigrationSetBuilder::new()
    }

    /// Loads every `*.sql` file (extension matched case-insensitively) in
    /// `path`. Subdirectories and other files are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::ReadDir`] if the directory cannot be listed,
    /// [`SourceError::ReadFile`] if a script cannot be read as UTF-8,
    /// [`SourceError::NonUtf8FileName`] if a script's name is not UTF-8, or
    /// [`SourceError::InvalidMigrations`] if the set fails validation.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let read_dir_error = |source| SourceError::ReadDir {
            path: path.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(path).map_err(read_dir_error)? {
            let file_path = entry.map_err(read_dir_error)?.path();
            if !file_path.is_file() || !has_migration_extension(&file_path) {
                continue;
            }

            let Some(file_name) = file_path.file_name().and_then(|n| n.to_str()) else {
                return Err(SourceError::NonUtf8FileName {
                    path: file_path.clone(),
                });
            };
            let content =
                std::fs::read_to_string(&file_path).map_err(|source| SourceError::ReadFile {
                    path: file_path.clone(),
                    source,
                })?;
            files.push(MigrationFile::new(file_name, content));
        }

        debug!(path = %path.display(), count = files.len(), "Discovered migration files");
        Self::new(files, MigrationSource::Directory(path.to_path_buf()))
    }

    /// Builds a set from scripts embedded with `include_str!`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidMigrations`] if the set fails validation.
    pub fn from_embedded(scripts: &[(&str, &str)]) -> Result<Self> {
        let files = scripts
            .iter()
            .map(|(name, content)| MigrationFile::new(*name, *content))
            .collect();
        Self::new(files, MigrationSource::Embedded)
    }

    fn new(mut files: Vec<MigrationFile>, source: MigrationSource) -> Result<Self> {
        files.sort_by(|a, b| a.file_name().cmp(b.file_name()));

        let errors = validate_migrations(&files);
        if !errors.is_empty() {
            return Err(SourceError::InvalidMigrations(errors));
        }

        Ok(Self { files, source })
    }

    /// Files in application order.
    pub fn files(&self) -> &[MigrationFile] {
        &self.files
    }

    pub fn iter(&self) -> impl Iterator<Item = &MigrationFile> {
        self.files.iter()
    }

    /// Looks up a file by version.
    pub fn get(&self, version: &MigrationVersion) -> Option<&MigrationFile> {
        self.files.iter().find(|file| file.version() == version)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn source(&self) -> &MigrationSource {
        &self.source
    }
}

fn has_migration_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(MIGRATION_EXTENSION))
}

enum PendingSource {
    Directory(PathBuf),
    Embedded(EmbeddedScripts),
}

/// Builder for a [`MigrationSet`] with a fallback chain.
///
/// Sources are tried in the order they are added. A directory that cannot be
/// listed falls through to the next source; any other failure (an unreadable
/// file, a version collision) is returned immediately so a broken directory
/// never silently gives way to a stale fallback. If every source is
/// unavailable, [`SourceError::NoSourcesAvailable`] is returned.
pub struct MigrationSetBuilder {
    sources: Vec<PendingSource>,
}

impl MigrationSetBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Adds a directory of migration scripts as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(PendingSource::Directory(path.into()));
        self
    }

    /// Adds embedded scripts as a source.
    pub fn with_embedded(mut self, scripts: EmbeddedScripts) -> Self {
        self.sources.push(PendingSource::Embedded(scripts));
        self
    }

    /// Loads the first available source.
    pub fn build(self) -> Result<MigrationSet> {
        for source in self.sources {
            let result = match source {
                PendingSource::Directory(path) => MigrationSet::from_dir(path),
                PendingSource::Embedded(scripts) => MigrationSet::from_embedded(scripts),
            };

            match result {
                Err(SourceError::ReadDir { path, source }) => {
                    debug!(path = %path.display(), error = %source, "Migration source unavailable");
                }
                other => return other,
            }
        }

        Err(SourceError::NoSourcesAvailable)
    }
}

impl Default for MigrationSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_migration(dir: &Path, name: &str, sql: &str) {
        std::fs::write(dir.join(name), format!("-- migrate:up\n{sql}\n")).unwrap();
    }

    #[test]
    fn test_from_dir_sorts_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        write_migration(dir.path(), "20240301_c.sql", "SELECT 3;");
        write_migration(dir.path(), "20240101_a.sql", "SELECT 1;");
        write_migration(dir.path(), "20240201_b.sql", "SELECT 2;");

        let set = MigrationSet::from_dir(dir.path()).unwrap();
        let names: Vec<&str> = set.iter().map(MigrationFile::file_name).collect();
        assert_eq!(names, vec!["20240101_a.sql", "20240201_b.sql", "20240301_c.sql"]);
        assert!(matches!(set.source(), MigrationSource::Directory(_)));
    }

    #[test]
    fn test_from_dir_ignores_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_migration(dir.path(), "001_books.sql", "SELECT 1;");
        std::fs::write(dir.path().join("README.md"), "notes").unwrap();
        std::fs::create_dir(dir.path().join("002_nested.sql")).unwrap();

        let set = MigrationSet::from_dir(dir.path()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.get(&MigrationVersion::new("001_books")).is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_from_dir_rejects_non_utf8_file_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        write_migration(dir.path(), "001_books.sql", "SELECT 1;");
        let bad_name = OsStr::from_bytes(b"002_r\xffating.sql");
        std::fs::write(dir.path().join(bad_name), "-- migrate:up\nSELECT 2;\n").unwrap();

        let err = MigrationSet::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, SourceError::NonUtf8FileName { .. }));
        assert!(err.to_string().contains("002_r"));
    }

    #[test]
    fn test_from_dir_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let set = MigrationSet::from_dir(dir.path()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_from_dir_missing_directory() {
        let err = MigrationSet::from_dir("/nonexistent/sqlmigrate/migrations").unwrap_err();
        assert!(matches!(err, SourceError::ReadDir { .. }));
        assert!(err.to_string().contains("/nonexistent/sqlmigrate/migrations"));
    }

    #[test]
    fn test_from_embedded_rejects_version_collision() {
        let err = MigrationSet::from_embedded(&[
            ("001_books.sql", "-- migrate:up\nSELECT 1;"),
            ("001_books.SQL", "-- migrate:up\nSELECT 2;"),
        ])
        .unwrap_err();
        assert!(matches!(err, SourceError::InvalidMigrations(_)));
        assert!(err.to_string().contains("duplicate migration version '001_books'"));
    }

    #[test]
    fn test_builder_falls_back_when_directory_missing() {
        static EMBEDDED: EmbeddedScripts = &[("001_books.sql", "-- migrate:up\nSELECT 1;")];
        let set = MigrationSet::builder()
            .from_dir("/nonexistent/sqlmigrate/migrations")
            .with_embedded(EMBEDDED)
            .build()
            .unwrap();
        assert_eq!(set.len(), 1);
        assert!(matches!(set.source(), MigrationSource::Embedded));
    }

    #[test]
    fn test_builder_prefers_first_available_source() {
        static EMBEDDED: EmbeddedScripts = &[("001_embedded.sql", "-- migrate:up\nSELECT 1;")];
        let dir = tempfile::tempdir().unwrap();
        write_migration(dir.path(), "001_disk.sql", "SELECT 1;");

        let set = MigrationSet::builder()
            .from_dir(dir.path())
            .with_embedded(EMBEDDED)
            .build()
            .unwrap();
        assert_eq!(set.files()[0].file_name(), "001_disk.sql");
    }

    #[test]
    fn test_builder_does_not_mask_invalid_directory() {
        static EMBEDDED: EmbeddedScripts = &[("001_books.sql", "-- migrate:up\nSELECT 1;")];
        let dir = tempfile::tempdir().unwrap();
        write_migration(dir.path(), "nounderscore.sql", "SELECT 1;");

        let err = MigrationSet::builder()
            .from_dir(dir.path())
            .with_embedded(EMBEDDED)
            .build()
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidMigrations(_)));
    }

    #[test]
    fn test_builder_all_unavailable() {
        let result = MigrationSet::builder()
            .from_dir("/nonexistent/one")
            .from_dir("/nonexistent/two")
            .build();
        assert!(matches!(result, Err(SourceError::NoSourcesAvailable)));

        assert!(matches!(
            MigrationSet::builder().build(),
            Err(SourceError::NoSourcesAvailable)
        ));
    }
}
