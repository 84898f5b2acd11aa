//! Error taxonomy for constraint handling.
//!
//! Three failure families flow out of a wrapped write:
//!
//! - [`WriteError::Statement`]: a raw failure no handler could translate;
//!   re-surfaced exactly as the persistence layer produced it.
//! - [`WriteError::Violation`]: a statement failure matched to a registered
//!   constraint, carrying the failing record's identity and the structured
//!   field error that was attached to it.
//! - [`WriteError::Invalid`]: the host layer's own pre-statement validation
//!   failure, passed through untouched.
//!
//! [`DeclarationError`] is separate: it is a programmer error raised at
//! record-type definition time and never caught internally.

use std::fmt;

use crate::constraint::ConstraintKind;
use crate::errors::{FieldError, InstanceId};
use crate::statement::StatementError;

/// Identity snapshot of the record a violation surfaced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    instance: InstanceId,
    table: String,
}

impl RecordRef {
    pub fn new(instance: InstanceId, table: impl Into<String>) -> Self {
        Self {
            instance,
            table: table.into(),
        }
    }

    /// Identity of the failing in-memory record instance.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Table of the failing record's type.
    pub fn table(&self) -> &str {
        &self.table
    }
}

/// A statement failure matched to a registered constraint.
///
/// Propagated up the caller chain during unwind; each ancestor frame imports
/// the inner [`FieldError`] into its own record unless the violation
/// surfaced from that record itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    record: RecordRef,
    error: FieldError,
    statement: StatementError,
}

impl ConstraintViolation {
    pub fn new(record: RecordRef, error: FieldError, statement: StatementError) -> Self {
        Self {
            record,
            error,
            statement,
        }
    }

    /// The record that was being written when the statement failed.
    pub fn record(&self) -> &RecordRef {
        &self.record
    }

    /// The structured error attached to the failing record.
    pub fn error(&self) -> &FieldError {
        &self.error
    }

    /// The original statement failure.
    pub fn statement(&self) -> &StatementError {
        &self.statement
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "constraint violation on {}.{}: {} ({})",
            self.record.table(),
            self.error.field,
            self.error.message,
            self.statement.message
        )
    }
}

impl std::error::Error for ConstraintViolation {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.statement)
    }
}

/// The host layer rejected the record before any statement ran.
///
/// Produced by the host's own validations; the engine only transports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    /// Identity of the invalid record.
    pub record: RecordRef,
    /// Host-provided description of the failure.
    pub message: String,
}

impl fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record invalid ({}): {}", self.record.table(), self.message)
    }
}

impl std::error::Error for InvalidRecord {}

/// Failure of a wrapped write operation.
#[derive(Debug)]
pub enum WriteError {
    /// Raw statement failure no handler translated.
    Statement(StatementError),
    /// Statement failure matched to a registered constraint.
    Violation(ConstraintViolation),
    /// Host validation failure, passed through unchanged.
    Invalid(InvalidRecord),
}

impl WriteError {
    /// The violation, if this is a translated constraint failure.
    pub fn violation(&self) -> Option<&ConstraintViolation> {
        match self {
            Self::Violation(v) => Some(v),
            _ => None,
        }
    }

    /// Whether this is a translated constraint failure.
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violation(_))
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statement(e) => write!(f, "{e}"),
            Self::Violation(e) => write!(f, "{e}"),
            Self::Invalid(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Statement(e) => Some(e),
            Self::Violation(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

impl From<StatementError> for WriteError {
    fn from(err: StatementError) -> Self {
        Self::Statement(err)
    }
}

impl From<ConstraintViolation> for WriteError {
    fn from(err: ConstraintViolation) -> Self {
        Self::Violation(err)
    }
}

impl From<InvalidRecord> for WriteError {
    fn from(err: InvalidRecord) -> Self {
        Self::Invalid(err)
    }
}

/// Invalid constraint declaration. Always a programmer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// The constraint name is already registered for this record type.
    DuplicateName {
        /// The conflicting database-visible name.
        name: String,
    },
    /// The declaration covers no keys.
    EmptyKeys {
        /// Kind of the offending declaration.
        kind: ConstraintKind,
    },
}

impl fmt::Display for DeclarationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => {
                write!(f, "constraint name already registered: {name}")
            }
            Self::EmptyKeys { kind } => {
                write!(f, "{kind} constraint declared with no keys")
            }
        }
    }
}

impl std::error::Error for DeclarationError {}
