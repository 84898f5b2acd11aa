//! Dialect handler contract.
//!
//! One handler exists per supported database dialect. The dispatcher walks a
//! fixed, configuration-time ordered list; the first handler whose
//! [`Handler::can_handle`] accepts the failure becomes responsible for it,
//! and its parse result is final. The [`NullHandler`] sits at the end of
//! every list, accepting everything and recognizing nothing, so an
//! unsupported dialect degrades to "unhandled" instead of crashing.

use crate::constraint::ConstraintKind;
use crate::record::Record;
use crate::statement::StatementError;

/// What a handler extracted from a raw statement failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedViolation {
    /// A constraint violation, resolved to a registered-name candidate.
    Constraint {
        /// Kind the dialect reported.
        kind: ConstraintKind,
        /// Database-visible constraint name to look up in the registry.
        name: String,
    },
    /// Nothing this handler recognizes as a constraint failure.
    Unrecognized,
}

/// A database-dialect error parser.
///
/// Implementations must identify their dialect by the failure's typed
/// [`DriverCause`](crate::statement::DriverCause) before touching the
/// diagnostic text, and must never panic on malformed or unexpected error
/// shapes: `can_handle` answers `false`, `parse` answers
/// [`ParsedViolation::Unrecognized`].
pub trait Handler: Send + Sync {
    /// Short dialect name, used in logs.
    fn name(&self) -> &'static str;

    /// Whether this failure belongs to the handler's dialect.
    fn can_handle(&self, err: &StatementError) -> bool;

    /// Extract the violated constraint from the failure.
    ///
    /// The record supplies the table name where a dialect identifies
    /// constraints by column list rather than by name.
    fn parse(&self, err: &StatementError, record: &dyn Record) -> ParsedViolation;
}

/// Catch-all handler terminating every handler list.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHandler;

impl Handler for NullHandler {
    fn name(&self) -> &'static str {
        "null"
    }

    /// Accepts any failure, so exactly one handler is always responsible.
    fn can_handle(&self, _err: &StatementError) -> bool {
        true
    }

    /// Recognizes nothing; the failure stays unhandled.
    fn parse(&self, _err: &StatementError, _record: &dyn Record) -> ParsedViolation {
        ParsedViolation::Unrecognized
    }
}
