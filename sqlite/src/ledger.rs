//! The `schema_migrations` ledger.
//!
//! One row per applied migration version. Rows are inserted inside the same
//! transaction as the migration they record and are never updated or
//! deleted here.

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use sqlmigrate_core::MigrationVersion;

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "schema_migrations";

const CREATE_LEDGER_SQL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
)";

/// A recorded migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub version: MigrationVersion,
    /// `None` when the stored value is missing or not a recognizable
    /// timestamp (rows written by other tools).
    pub applied_at: Option<NaiveDateTime>,
}

/// Read and append access to the ledger table through a borrowed connection.
///
/// Accepts a [`rusqlite::Transaction`] as well, via deref, so a row can be
/// recorded atomically with the migration it describes.
pub struct Ledger<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Ledger<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates the ledger table if it does not exist.
    pub fn ensure_table(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(CREATE_LEDGER_SQL)
    }

    /// Returns `true` if a row exists for `version`.
    pub fn contains(&self, version: &MigrationVersion) -> rusqlite::Result<bool> {
        self.conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                [version.as_str()],
                |_| Ok(()),
            )
            .optional()
            .map(|row| row.is_some())
    }

    /// All rows ordered by version.
    pub fn entries(&self) -> rusqlite::Result<Vec<LedgerEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT version, applied_at FROM schema_migrations ORDER BY version")?;
        let rows = stmt.query_map([], |row| {
            let version: String = row.get(0)?;
            let applied_at: Option<String> = row.get(1)?;
            Ok(LedgerEntry {
                version: MigrationVersion::new(version),
                applied_at: applied_at.as_deref().and_then(parse_timestamp),
            })
        })?;
        rows.collect()
    }

    /// Inserts the row for `version`.
    ///
    /// Fails with a constraint violation if the version is already recorded.
    pub fn record(&self, version: &MigrationVersion) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            params![version.as_str()],
        )?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        Ledger::new(&conn).ensure_table().unwrap();
        conn
    }

    #[test]
    fn test_ensure_table_is_idempotent() {
        let conn = ledger_conn();
        Ledger::new(&conn).ensure_table().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [LEDGER_TABLE],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_record_and_contains() {
        let conn = ledger_conn();
        let ledger = Ledger::new(&conn);
        let version = MigrationVersion::new("001_books");

        assert!(!ledger.contains(&version).unwrap());
        ledger.record(&version).unwrap();
        assert!(ledger.contains(&version).unwrap());
    }

    #[test]
    fn test_record_twice_violates_primary_key() {
        let conn = ledger_conn();
        let ledger = Ledger::new(&conn);
        let version = MigrationVersion::new("001_books");

        ledger.record(&version).unwrap();
        assert!(ledger.record(&version).is_err());
        assert_eq!(ledger.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_entries_are_ordered_and_timestamped() {
        let conn = ledger_conn();
        let ledger = Ledger::new(&conn);
        ledger.record(&MigrationVersion::new("002_series")).unwrap();
        ledger.record(&MigrationVersion::new("001_books")).unwrap();

        let entries = ledger.entries().unwrap();
        let versions: Vec<&str> = entries.iter().map(|e| e.version.as_str()).collect();
        assert_eq!(versions, vec!["001_books", "002_series"]);
        assert!(entries.iter().all(|e| e.applied_at.is_some()));
    }

    #[test]
    fn test_entries_tolerate_foreign_timestamps() {
        let conn = ledger_conn();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES ('001_a', NULL), ('002_b', 'yesterday'), ('003_c', '2024-05-01T10:20:30.123')",
            [],
        )
        .unwrap();

        let entries = Ledger::new(&conn).entries().unwrap();
        assert_eq!(entries[0].applied_at, None);
        assert_eq!(entries[1].applied_at, None);
        assert_eq!(
            entries[2].applied_at.map(|t| t.to_string()),
            Some("2024-05-01 10:20:30.123".to_string())
        );
    }

    #[test]
    fn test_parse_timestamp_sqlite_default_format() {
        let parsed = parse_timestamp("2024-01-02 03:04:05").unwrap();
        assert_eq!(parsed.to_string(), "2024-01-02 03:04:05");
    }
}
