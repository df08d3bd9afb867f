//! Quote-aware SQL lexing.
//!
//! Strips `--` line comments and splits SQL text on statement terminators
//! while honoring single- and double-quoted literals. Inside a literal, a
//! doubled quote character (`'it''s'`) is an escaped quote, not a terminator.
//!
//! This is not a SQL grammar. Only quotes, line comments and semicolons are
//! recognized; trigger or procedure bodies with embedded semicolons are split
//! like any other text.
//!
//! # Examples
//!
//! ```
//! use sqlmigrate_core::{remove_comments, split_statements};
//!
//! let sql = remove_comments("INSERT INTO t VALUES ('a;b'); -- seed\nSELECT 1;");
//! assert_eq!(
//!     split_statements(&sql),
//!     vec!["INSERT INTO t VALUES ('a;b')", " \nSELECT 1"],
//! );
//! ```

use std::iter::Peekable;
use std::str::Chars;

/// Removes `--` line comments that appear outside quoted literals.
///
/// The comment runs up to, but not including, the next newline, so line
/// numbers in the output match the input.
///
/// # Examples
///
/// ```
/// use sqlmigrate_core::remove_comments;
///
/// assert_eq!(remove_comments("SELECT 1; -- one\n"), "SELECT 1; \n");
/// assert_eq!(remove_comments("SELECT '--x';"), "SELECT '--x';");
/// ```
pub fn remove_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut quote = None;

    while let Some(ch) = chars.next() {
        if copy_quoted(ch, &mut chars, &mut quote, &mut out) {
            continue;
        }

        if ch == '-' && chars.peek() == Some(&'-') {
            while chars.next_if(|&next| next != '\n').is_some() {}
            continue;
        }

        out.push(ch);
    }

    out
}

/// Splits SQL on semicolons that appear outside quoted literals.
///
/// Terminators are not included in the fragments and surrounding whitespace
/// is kept as found. A non-empty trailing fragment after the last terminator
/// is returned as the final statement, so whitespace-only input yields one
/// blank fragment and empty input yields none.
///
/// Expects comment-free input; see [`remove_comments`].
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();
    let mut quote = None;

    while let Some(ch) = chars.next() {
        if copy_quoted(ch, &mut chars, &mut quote, &mut current) {
            continue;
        }

        if ch == ';' {
            statements.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }

    if !current.is_empty() {
        statements.push(current);
    }

    statements
}

/// Returns the statements of an apply section that should be executed.
///
/// Comments are removed, the text is split, and each fragment is trimmed.
/// Blank fragments are dropped.
///
/// # Examples
///
/// ```
/// use sqlmigrate_core::executable_statements;
///
/// let statements = executable_statements("CREATE TABLE a (id INTEGER); -- first\n;\n");
/// assert_eq!(statements, vec!["CREATE TABLE a (id INTEGER)"]);
/// ```
pub fn executable_statements(sql: &str) -> Vec<String> {
    split_statements(&remove_comments(sql))
        .iter()
        .map(|statement| statement.trim())
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}

/// Copies `ch` to `out` when it opens, continues, or closes a quoted literal.
///
/// Returns `false` when `ch` is outside any literal and is not a quote, in
/// which case the caller handles it.
fn copy_quoted(
    ch: char,
    chars: &mut Peekable<Chars<'_>>,
    quote: &mut Option<char>,
    out: &mut String,
) -> bool {
    match *quote {
        Some(active) => {
            out.push(ch);
            if ch == active {
                if let Some(escaped) = chars.next_if_eq(&active) {
                    out.push(escaped);
                } else {
                    *quote = None;
                }
            }
            true
        }
        None if ch == '\'' || ch == '"' => {
            *quote = Some(ch);
            out.push(ch);
            true
        }
        None => false,
    }
}
