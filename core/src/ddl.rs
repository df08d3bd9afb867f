//! Recognition of the DDL shapes the migrator reasons about.
//!
//! Only `ALTER TABLE <table> ADD [COLUMN] <column> ...` is recognized.
//! Identifiers are read by keyword position: the first whitespace-delimited
//! token after `TABLE`, and after `ADD` or `ADD COLUMN`. Quoted (`"name"`,
//! `` `name` ``) and bracketed (`[name]`) identifiers are not unquoted; they
//! fail [`is_valid_identifier`] and callers treat the statement as opaque.

/// Table and column named by an `ALTER TABLE .. ADD COLUMN ..` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddColumn {
    pub table: String,
    pub column: String,
}

impl AddColumn {
    /// Returns `true` when both identifiers are safe to interpolate into an
    /// introspection query.
    pub fn has_plain_identifiers(&self) -> bool {
        is_valid_identifier(&self.table) && is_valid_identifier(&self.column)
    }
}

/// Parses an `ALTER TABLE .. ADD [COLUMN] ..` statement.
///
/// Keywords match case-insensitively. Returns `None` for every other
/// statement shape.
///
/// # Examples
///
/// ```
/// use sqlmigrate_core::{AddColumn, parse_add_column};
///
/// assert_eq!(
///     parse_add_column("alter table books add column rating REAL DEFAULT 0"),
///     Some(AddColumn { table: "books".into(), column: "rating".into() }),
/// );
/// assert_eq!(parse_add_column("CREATE TABLE books (id INTEGER)"), None);
/// ```
pub fn parse_add_column(statement: &str) -> Option<AddColumn> {
    let tokens: Vec<&str> = statement.split_whitespace().collect();
    let [alter, table_keyword, table, add, rest @ ..] = tokens.as_slice() else {
        return None;
    };
    if !alter.eq_ignore_ascii_case("ALTER")
        || !table_keyword.eq_ignore_ascii_case("TABLE")
        || !add.eq_ignore_ascii_case("ADD")
    {
        return None;
    }

    let column = match rest {
        [keyword, column, ..] if keyword.eq_ignore_ascii_case("COLUMN") => column,
        [keyword] if keyword.eq_ignore_ascii_case("COLUMN") => return None,
        [column, ..] => column,
        [] => return None,
    };

    Some(AddColumn {
        table: (*table).to_string(),
        column: (*column).to_string(),
    })
}

/// Returns `true` for `[A-Za-z_][A-Za-z0-9_]*`.
///
/// # Examples
///
/// ```
/// use sqlmigrate_core::is_valid_identifier;
///
/// assert!(is_valid_identifier("book_2"));
/// assert!(!is_valid_identifier("2books"));
/// assert!(!is_valid_identifier("books); DROP TABLE x; --"));
/// ```
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
