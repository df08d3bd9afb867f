//! Migration set validation.
//!
//! Checks the invariants a set of migration files must hold before any of
//! them is applied: every file name has a `<prefix>_<description>` shape and
//! no two files normalize to the same version.
//!
//! # Examples
//!
//! ```
//! use sqlmigrate_core::*;
//!
//! let files = vec![
//!     MigrationFile::new("001_books.sql", "-- migrate:up\nSELECT 1;"),
//!     MigrationFile::new("002_series.sql", "-- migrate:up\nSELECT 2;"),
//! ];
//! assert!(validate_migrations(&files).is_empty());
//!
//! // `001_books.SQL` normalizes to the same version as `001_books.sql`.
//! let files = vec![
//!     MigrationFile::new("001_books.sql", "-- migrate:up\nSELECT 1;"),
//!     MigrationFile::new("001_books.SQL", "-- migrate:up\nSELECT 1;"),
//! ];
//! let errors = validate_migrations(&files);
//! assert!(matches!(errors[0], ValidationError::DuplicateVersion { .. }));
//! ```

use std::collections::HashMap;

use thiserror::Error;

use crate::types::MigrationFile;

/// Problems found in a migration set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Two files map to the same version.
    #[error("duplicate migration version '{version}' from '{first}' and '{second}'")]
    DuplicateVersion {
        version: String,
        first: String,
        second: String,
    },
    /// The file name lacks a `<prefix>_<description>` shape.
    #[error("invalid migration file name '{0}': expected <prefix>_<description>.sql")]
    InvalidFileName(String),
}

/// Validates a migration set, returning every problem found.
///
/// An empty set is valid.
pub fn validate_migrations(files: &[MigrationFile]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for file in files {
        let version = file.version().as_str();

        let well_formed = matches!(
            version.split_once('_'),
            Some((prefix, description)) if !prefix.is_empty() && !description.is_empty()
        );
        if !well_formed {
            errors.push(ValidationError::InvalidFileName(file.file_name().to_string()));
        }

        match seen.get(version) {
            Some(first) => errors.push(ValidationError::DuplicateVersion {
                version: version.to_string(),
                first: (*first).to_string(),
                second: file.file_name().to_string(),
            }),
            None => {
                seen.insert(version, file.file_name());
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> MigrationFile {
        MigrationFile::new(name, "-- migrate:up\nSELECT 1;")
    }

    #[test]
    fn test_empty_set_is_valid() {
        assert!(validate_migrations(&[]).is_empty());
    }

    #[test]
    fn test_duplicate_version_names_both_files() {
        let errors = validate_migrations(&[file("001_a.sql"), file("002_b.sql"), file("001_a.Sql")]);
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateVersion {
                version: "001_a".to_string(),
                first: "001_a.sql".to_string(),
                second: "001_a.Sql".to_string(),
            }]
        );
    }

    #[test]
    fn test_invalid_file_names() {
        let errors = validate_migrations(&[
            file("init.sql"),
            file("_missing_prefix.sql"),
            file("001_.sql"),
            file("001_ok.sql"),
        ]);
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidFileName("init.sql".to_string()),
                ValidationError::InvalidFileName("_missing_prefix.sql".to_string()),
                ValidationError::InvalidFileName("001_.sql".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::InvalidFileName("init.sql".to_string());
        assert_eq!(
            err.to_string(),
            "invalid migration file name 'init.sql': expected <prefix>_<description>.sql"
        );
    }
}
