//! Raw statement failures, as reported by the host persistence layer.
//!
//! A [`StatementError`] is opaque to the engine except for two things: the
//! typed [`DriverCause`] the driver attached, and the dialect-specific
//! diagnostic text. Handlers identify their dialect by the cause first and
//! only then parse the text; text-only heuristics across dialects are not
//! allowed.

use std::fmt;

/// SQLSTATE class 23 codes PostgreSQL reports for constraint failures.
pub mod sqlstate {
    /// `unique_violation`
    pub const UNIQUE_VIOLATION: &str = "23505";
    /// `check_violation`
    pub const CHECK_VIOLATION: &str = "23514";
    /// `exclusion_violation`
    pub const EXCLUSION_VIOLATION: &str = "23P01";
    /// `foreign_key_violation`
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
}

/// SQLite primary result code for constraint failures.
pub const SQLITE_CONSTRAINT: i32 = 19;

/// SQLite extended result codes for specific constraint failures.
pub mod sqlite_code {
    /// `SQLITE_CONSTRAINT_UNIQUE`
    pub const CONSTRAINT_UNIQUE: i32 = 2067;
    /// `SQLITE_CONSTRAINT_PRIMARYKEY`
    pub const CONSTRAINT_PRIMARYKEY: i32 = 1555;
    /// `SQLITE_CONSTRAINT_CHECK`
    pub const CONSTRAINT_CHECK: i32 = 275;
    /// `SQLITE_CONSTRAINT_FOREIGNKEY`
    pub const CONSTRAINT_FOREIGNKEY: i32 = 787;
}

/// The typed cause a database driver attached to a failed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCause {
    /// A PostgreSQL error, identified by its SQLSTATE code.
    Postgres {
        /// Five-character SQLSTATE, e.g. `23505`.
        code: String,
    },
    /// A SQLite error, identified by its result codes.
    Sqlite {
        /// Primary result code, e.g. 19 for `SQLITE_CONSTRAINT`.
        code: i32,
        /// Extended result code, e.g. 2067 for `SQLITE_CONSTRAINT_UNIQUE`.
        extended: i32,
    },
    /// No typed cause available.
    Unknown,
}

/// A write statement the database rejected, with whatever diagnostics the
/// driver provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementError {
    /// Typed cause from the driver.
    pub cause: DriverCause,
    /// Primary diagnostic message.
    pub message: String,
    /// Secondary diagnostic detail, when the driver provides one.
    pub detail: Option<String>,
    /// The statement that failed, when known.
    pub sql: Option<String>,
}

impl StatementError {
    /// A PostgreSQL failure with the given SQLSTATE and primary message.
    pub fn postgres(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            cause: DriverCause::Postgres { code: code.into() },
            message: message.into(),
            detail: None,
            sql: None,
        }
    }

    /// A SQLite failure with the given result codes and message.
    pub fn sqlite(code: i32, extended: i32, message: impl Into<String>) -> Self {
        Self {
            cause: DriverCause::Sqlite { code, extended },
            message: message.into(),
            detail: None,
            sql: None,
        }
    }

    /// A failure with no typed cause.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            cause: DriverCause::Unknown,
            message: message.into(),
            detail: None,
            sql: None,
        }
    }

    /// Attach the secondary diagnostic detail.
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach the failing statement.
    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    /// Whether the driver marked this as a uniqueness violation.
    pub fn is_unique_violation(&self) -> bool {
        match &self.cause {
            DriverCause::Postgres { code } => code == sqlstate::UNIQUE_VIOLATION,
            DriverCause::Sqlite { extended, .. } => {
                *extended == sqlite_code::CONSTRAINT_UNIQUE
                    || *extended == sqlite_code::CONSTRAINT_PRIMARYKEY
            }
            DriverCause::Unknown => false,
        }
    }

    /// Whether the driver marked this as a foreign key violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        match &self.cause {
            DriverCause::Postgres { code } => code == sqlstate::FOREIGN_KEY_VIOLATION,
            DriverCause::Sqlite { extended, .. } => {
                *extended == sqlite_code::CONSTRAINT_FOREIGNKEY
            }
            DriverCause::Unknown => false,
        }
    }
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            DriverCause::Postgres { code } => {
                write!(f, "statement failed (SQLSTATE {code}): {}", self.message)
            }
            DriverCause::Sqlite { code, extended } => {
                write!(
                    f,
                    "statement failed (SQLite {code}/{extended}): {}",
                    self.message
                )
            }
            DriverCause::Unknown => write!(f, "statement failed: {}", self.message),
        }
    }
}

impl std::error::Error for StatementError {}
