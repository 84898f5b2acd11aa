//! PostgreSQL constraint-error handler for dbvet.
//!
//! PostgreSQL names the violated constraint in the primary diagnostic
//! message, e.g.
//!
//! ```text
//! duplicate key value violates unique constraint "index_users_on_email"
//! new row for relation "users" violates check constraint "chk_6a7f0e8b21"
//! ```
//!
//! The handler accepts a failure only when its typed cause is a PostgreSQL
//! SQLSTATE from class 23 covering the four supported constraint kinds,
//! then extracts the quoted name with a single fixed pattern.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use dbvet_core::{
    ConstraintKind, DriverCause, Handler, ParsedViolation, Record, StatementError, sqlstate,
};

/// One of four constraint phrases followed by the quoted constraint name.
const CONSTRAINT_PATTERN: &str =
    r#"(unique constraint|check constraint|exclusion constraint|foreign key constraint) "([^"]+)""#;

fn constraint_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(CONSTRAINT_PATTERN).expect("valid constraint pattern"))
}

/// Handler for failures raised by the PostgreSQL driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresHandler;

impl PostgresHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for PostgresHandler {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn can_handle(&self, err: &StatementError) -> bool {
        let DriverCause::Postgres { code } = &err.cause else {
            return false;
        };
        matches!(
            code.as_str(),
            sqlstate::UNIQUE_VIOLATION
                | sqlstate::CHECK_VIOLATION
                | sqlstate::EXCLUSION_VIOLATION
                | sqlstate::FOREIGN_KEY_VIOLATION
        )
    }

    fn parse(&self, err: &StatementError, _record: &dyn Record) -> ParsedViolation {
        let Some(captures) = constraint_regex().captures(&err.message) else {
            debug!(message = %err.message, "no constraint phrase in postgres diagnostic");
            return ParsedViolation::Unrecognized;
        };

        let kind = match &captures[1] {
            "unique constraint" => ConstraintKind::Unique,
            "check constraint" => ConstraintKind::Check,
            "exclusion constraint" => ConstraintKind::Exclusion,
            "foreign key constraint" => ConstraintKind::ForeignKey,
            _ => return ParsedViolation::Unrecognized,
        };

        ParsedViolation::Constraint {
            kind,
            name: captures[2].to_string(),
        }
    }
}
