//! Migration script sections.
//!
//! A migration file holds an apply section after a `-- migrate:up` marker and
//! an optional revert section after `-- migrate:down`:
//!
//! ```text
//! -- migrate:up
//! CREATE TABLE books (id INTEGER PRIMARY KEY);
//!
//! -- migrate:down
//! DROP TABLE books;
//! ```
//!
//! Only the apply section is ever executed. The revert section is kept for
//! inspection.

use thiserror::Error;

use crate::lexer::executable_statements;

/// Line that opens the apply section.
pub const APPLY_MARKER: &str = "-- migrate:up";

/// Line that opens the revert section and closes the apply section.
pub const REVERT_MARKER: &str = "-- migrate:down";

/// Errors raised while reading the sections of a migration script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// No line equals the apply marker.
    #[error("no '-- migrate:up' section")]
    MissingApplySection,
    /// The apply marker is present but nothing executable follows it.
    #[error("'-- migrate:up' section is empty")]
    EmptyApplySection,
}

/// The parsed sections of one migration file.
///
/// # Examples
///
/// ```
/// use sqlmigrate_core::MigrationScript;
///
/// let script = MigrationScript::parse(
///     "-- migrate:up\nCREATE TABLE a (id INTEGER);\n-- migrate:down\nDROP TABLE a;\n",
/// )
/// .unwrap();
/// assert_eq!(script.apply, "CREATE TABLE a (id INTEGER);");
/// assert_eq!(script.revert.as_deref(), Some("DROP TABLE a;"));
/// assert_eq!(script.statements(), vec!["CREATE TABLE a (id INTEGER)"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    /// Body of the apply section, trimmed.
    pub apply: String,
    /// Body of the revert section, if any. Never executed.
    pub revert: Option<String>,
}

impl MigrationScript {
    /// Splits a migration file into its sections.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::MissingApplySection`] when there is no apply
    /// marker and [`ScriptError::EmptyApplySection`] when the marker is
    /// followed only by blank or comment lines.
    pub fn parse(content: &str) -> Result<Self, ScriptError> {
        let sections = Sections::scan(content);
        if !sections.has_apply_marker {
            return Err(ScriptError::MissingApplySection);
        }
        let apply = join_body(&sections.apply).ok_or(ScriptError::EmptyApplySection)?;
        Ok(Self {
            apply,
            revert: join_body(&sections.revert),
        })
    }

    /// Statements of the apply section in execution order.
    pub fn statements(&self) -> Vec<String> {
        executable_statements(&self.apply)
    }
}

/// Extracts the apply section of a migration file.
///
/// Capture begins after a line equal to [`APPLY_MARKER`] (surrounding
/// whitespace ignored) and stops at a line equal to [`REVERT_MARKER`].
/// Blank lines and whole-line `--` comments are dropped; trailing comments
/// on SQL lines are kept for the lexer to remove.
///
/// Returns `None` when there is no apply marker or the section is empty.
///
/// # Examples
///
/// ```
/// use sqlmigrate_core::extract_apply_section;
///
/// let content = "-- header\n-- migrate:up\n-- note\nCREATE TABLE t (id INTEGER); -- tail\n";
/// assert_eq!(
///     extract_apply_section(content).as_deref(),
///     Some("CREATE TABLE t (id INTEGER); -- tail"),
/// );
/// assert_eq!(extract_apply_section("-- migrate:down\nDROP TABLE t;"), None);
/// ```
pub fn extract_apply_section(content: &str) -> Option<String> {
    join_body(&Sections::scan(content).apply)
}

#[derive(Debug, Default)]
struct Sections<'a> {
    has_apply_marker: bool,
    apply: Vec<&'a str>,
    revert: Vec<&'a str>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Position {
    Preamble,
    Apply,
    Revert,
}

impl<'a> Sections<'a> {
    fn scan(content: &'a str) -> Self {
        let mut sections = Sections::default();
        let mut position = Position::Preamble;

        // Editors on Windows often save with a byte-order mark.
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed == REVERT_MARKER {
                position = Position::Revert;
                continue;
            }
            if trimmed == APPLY_MARKER {
                if position == Position::Preamble {
                    sections.has_apply_marker = true;
                    position = Position::Apply;
                }
                continue;
            }
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }

            match position {
                Position::Preamble => {}
                Position::Apply => sections.apply.push(line),
                Position::Revert => sections.revert.push(line),
            }
        }

        sections
    }
}

fn join_body(lines: &[&str]) -> Option<String> {
    let body = lines.join("\n");
    let body = body.trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}
