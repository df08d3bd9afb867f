//! Error types for migration discovery and configuration.

use std::path::PathBuf;

use sqlmigrate_core::ValidationError;
use thiserror::Error;

/// Errors that can occur while locating migrations or loading configuration.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The migrations directory could not be listed.
    #[error("failed to read migrations directory '{}': {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration file could not be read.
    #[error("failed to read migration file '{}': {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration file name is not valid UTF-8, so its version is unknown.
    #[error("migration file name '{}' is not valid UTF-8", .path.display())]
    NonUtf8FileName { path: PathBuf },

    /// File I/O failure outside discovery (config files, database directories).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The migration set breaks one or more invariants.
    #[error("invalid migration set: {}", join_errors(.0))]
    InvalidMigrations(Vec<ValidationError>),

    /// Configuration is structurally valid YAML but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// All configured migration sources failed.
    #[error("no migration sources available")]
    NoSourcesAvailable,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`SourceError`].
pub type Result<T> = std::result::Result<T, SourceError>;
