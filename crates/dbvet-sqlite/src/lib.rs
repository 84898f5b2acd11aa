//! SQLite constraint-error handler for dbvet.
//!
//! SQLite does not quote a constraint name the way PostgreSQL does. Its
//! diagnostics name either an index or the failing columns:
//!
//! ```text
//! UNIQUE constraint failed: users.email
//! UNIQUE constraint failed: users.org_id, users.email
//! UNIQUE constraint failed: index 'index_users_on_email'
//! CHECK constraint failed: chk_6a7f0e8b21
//! ```
//!
//! For uniqueness violations the handler strips the table prefix from each
//! column and re-derives the registered name through the same inference the
//! registry used at declaration time, so the naming convention must stay
//! invertible from the engine's own error text.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use dbvet_core::{
    ConstraintKind, DriverCause, Handler, ParsedViolation, Record, SQLITE_CONSTRAINT,
    StatementError, naming,
};

/// Constraint phrase and the free-text remainder of the diagnostic.
const FAILED_PATTERN: &str = r"(UNIQUE|CHECK) constraint failed(.+)?";

/// Index-name or column-list fragment at the end of the remainder, with an
/// optional trailing result code such as ` (19)`.
const TARGET_PATTERN: &str = r": (index ')?([^']+)'?(?: \(\d+\))?$";

fn failed_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(FAILED_PATTERN).expect("valid failed pattern"))
}

fn target_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(TARGET_PATTERN).expect("valid target pattern"))
}

/// Handler for failures raised by the SQLite driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteHandler;

impl SqliteHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for SqliteHandler {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn can_handle(&self, err: &StatementError) -> bool {
        matches!(
            err.cause,
            DriverCause::Sqlite { code, .. } if code == SQLITE_CONSTRAINT
        )
    }

    fn parse(&self, err: &StatementError, record: &dyn Record) -> ParsedViolation {
        let Some(failed) = failed_regex().captures(&err.message) else {
            debug!(message = %err.message, "no constraint phrase in sqlite diagnostic");
            return ParsedViolation::Unrecognized;
        };

        let Some(rest) = failed.get(2) else {
            return ParsedViolation::Unrecognized;
        };
        let Some(target) = target_regex().captures(rest.as_str()) else {
            debug!(message = %err.message, "no index or column fragment in sqlite diagnostic");
            return ParsedViolation::Unrecognized;
        };
        let index_form = target.get(1).is_some();
        let fragment = &target[2];

        match &failed[1] {
            // The index form already carries the registered name.
            "UNIQUE" if index_form => ParsedViolation::Constraint {
                kind: ConstraintKind::Unique,
                name: fragment.to_string(),
            },
            "UNIQUE" => {
                let table = record.table_name();
                let prefix = format!("{table}.");
                let columns: Vec<String> = fragment
                    .split(", ")
                    .map(|column| column.strip_prefix(&prefix).unwrap_or(column).to_string())
                    .collect();
                ParsedViolation::Constraint {
                    kind: ConstraintKind::Unique,
                    name: naming::unique_index_name(table, &columns),
                }
            }
            "CHECK" => ParsedViolation::Constraint {
                kind: ConstraintKind::Check,
                name: fragment.to_string(),
            },
            _ => ParsedViolation::Unrecognized,
        }
    }
}
