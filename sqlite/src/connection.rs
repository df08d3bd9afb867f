//! Opening and configuring SQLite connections.

use std::path::Path;

use rusqlite::Connection;
use sqlmigrate_source::PragmaConfig;
use tracing::debug;

use crate::error::Result;

/// Opens the database at `path`, creating its parent directory if needed,
/// and applies `pragmas`.
pub fn open_database(path: impl AsRef<Path>, pragmas: &PragmaConfig) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    debug!(path = %path.display(), "Opening database");
    let conn = Connection::open(path)?;
    apply_pragmas(&conn, pragmas)?;
    Ok(conn)
}

/// Applies connection pragmas.
pub fn apply_pragmas(conn: &Connection, pragmas: &PragmaConfig) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", pragmas.foreign_keys)?;
    if let Some(mode) = pragmas.journal_mode {
        let active: String =
            conn.pragma_update_and_check(None, "journal_mode", mode.as_sql(), |row| row.get(0))?;
        debug!(requested = mode.as_sql(), active = %active, "Set journal mode");
    }
    Ok(())
}
