//! Idempotency guard for additive column changes.
//!
//! The ledger and the live schema can disagree: a backup restored without its
//! ledger rows, a column added by hand, a run that was interrupted and
//! repaired manually. Re-running `ALTER TABLE .. ADD COLUMN ..` against a
//! table that already has the column fails with "duplicate column name", so
//! such statements are checked against the live schema first.
//!
//! Only that one statement shape is inspected. Anything the guard cannot
//! reason about is executed.
//!
//! Columns match by name alone, and inspection sees the migration's own
//! uncommitted changes. A migration that adds the same column twice
//! therefore skips the second `ADD COLUMN`, even when its type differs.

use rusqlite::Connection;
use sqlmigrate_core::{AddColumn, parse_add_column};
use tracing::debug;

/// Live schema lookups the guard relies on.
///
/// Implemented for [`Connection`]; pass `&*tx` to inspect through a
/// [`rusqlite::Transaction`] and see its uncommitted changes.
pub trait SchemaInspector {
    /// Returns `true` if `table` has a column whose name matches `column`
    /// case-insensitively. A missing table has no columns.
    fn has_column(&self, table: &str, column: &str) -> rusqlite::Result<bool>;
}

impl SchemaInspector for Connection {
    fn has_column(&self, table: &str, column: &str) -> rusqlite::Result<bool> {
        let mut stmt = self.prepare("SELECT name FROM pragma_table_info(?1)")?;
        let mut rows = stmt.query([table])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            if name.eq_ignore_ascii_case(column) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Returns `true` when `statement` adds a column that already exists.
///
/// Returns `false` for every other statement, for statements whose table or
/// column is not a plain identifier (quoted, bracketed, or schema-qualified
/// names), and when the schema cannot be inspected.
pub fn should_skip(statement: &str, inspector: &impl SchemaInspector) -> bool {
    let Some(add) = parse_add_column(statement) else {
        return false;
    };
    if !add.has_plain_identifiers() {
        debug!(table = %add.table, column = %add.column, "Not inspecting non-plain identifiers");
        return false;
    }

    let AddColumn { table, column } = add;
    match inspector.has_column(&table, &column) {
        Ok(exists) => exists,
        Err(err) => {
            debug!(
                %table,
                %column,
                error = %err,
                "Column introspection failed, executing statement"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE books (id INTEGER PRIMARY KEY, Rating REAL);")
            .unwrap();
        conn
    }

    #[test]
    fn test_skips_existing_column() {
        let conn = books_conn();
        assert!(should_skip("ALTER TABLE books ADD COLUMN Rating REAL", &conn));
    }

    #[test]
    fn test_column_match_is_case_insensitive() {
        let conn = books_conn();
        assert!(should_skip("alter table books add column rating real", &conn));
        assert!(should_skip("ALTER TABLE BOOKS ADD RATING REAL", &conn));
    }

    #[test]
    fn test_new_column_is_executed() {
        let conn = books_conn();
        assert!(!should_skip("ALTER TABLE books ADD COLUMN pages INTEGER", &conn));
    }

    #[test]
    fn test_missing_table_is_executed() {
        let conn = books_conn();
        assert!(!should_skip("ALTER TABLE series ADD COLUMN rating REAL", &conn));
    }

    #[test]
    fn test_other_statements_are_executed() {
        let conn = books_conn();
        assert!(!should_skip("CREATE TABLE books (id INTEGER)", &conn));
        assert!(!should_skip("ALTER TABLE books RENAME COLUMN Rating TO score", &conn));
        assert!(!should_skip("INSERT INTO books (Rating) VALUES (1.0)", &conn));
    }

    #[test]
    fn test_quoted_identifiers_are_not_inspected() {
        let conn = books_conn();
        assert!(!should_skip(r#"ALTER TABLE "books" ADD COLUMN "Rating" REAL"#, &conn));
        assert!(!should_skip("ALTER TABLE books ADD COLUMN [Rating] REAL", &conn));
        assert!(!should_skip("ALTER TABLE main.books ADD COLUMN Rating REAL", &conn));
    }

    struct BrokenInspector;

    impl SchemaInspector for BrokenInspector {
        fn has_column(&self, _table: &str, _column: &str) -> rusqlite::Result<bool> {
            Err(rusqlite::Error::InvalidQuery)
        }
    }

    #[test]
    fn test_introspection_failure_is_executed() {
        assert!(!should_skip("ALTER TABLE books ADD COLUMN rating REAL", &BrokenInspector));
    }

    #[test]
    fn test_sees_uncommitted_changes_in_transaction() {
        let mut conn = Connection::open_in_memory().unwrap();
        let tx = conn.transaction().unwrap();
        tx.execute_batch("CREATE TABLE series (id INTEGER, total INTEGER);")
            .unwrap();
        assert!(should_skip("ALTER TABLE series ADD COLUMN total INTEGER", &*tx));
        tx.rollback().unwrap();
        assert!(!should_skip("ALTER TABLE series ADD COLUMN total INTEGER", &conn));
    }
}
