//! Translate database constraint violations into per-field validation
//! errors.
//!
//! Databases reject some writes only at statement time: a duplicate key, a
//! failed CHECK, an overlapping exclusion range, a dangling foreign key.
//! dbvet lets application code treat those rejections the same way it
//! treats ordinary validation failures, as structured errors on a field of
//! the record that attempted the write, without leaking driver-specific
//! error formats.
//!
//! Constraints are declared once per record type and keyed by their
//! database-visible names (inferred deterministically when not given). A
//! [`Translator`] configured with dialect handlers wraps the host
//! persistence layer's writes; when a statement fails, the responsible
//! handler parses the diagnostic, the failing record's registry resolves
//! the constraint, and the record's error collection receives the declared
//! field error. Failures on records written as a side effect of saving a
//! parent are attributed to the failing record and imported into each
//! ancestor's errors exactly once.
//!
//! ```rust,ignore
//! use dbvet::prelude::*;
//! use dbvet_postgres::PostgresHandler;
//! use dbvet_sqlite::SqliteHandler;
//!
//! // At record-type definition time:
//! let mut constraints = ConstraintSet::for_table("users");
//! constraints.unique_constraint(Unique::new(["email"]))?;
//!
//! // At configuration time:
//! let translator = Translator::builder()
//!     .handler(PostgresHandler::new())
//!     .handler(SqliteHandler::new())
//!     .build();
//!
//! // At write time (User implements Persist):
//! if !translator.save(&mut user, &Default::default())? {
//!     assert_eq!(
//!         user.errors().details(),
//!         serde_json::json!({"email": [{"error": "taken"}]}),
//!     );
//! }
//! ```
//!
//! Failures no handler recognizes (foreign dialects, unregistered
//! constraint names, non-constraint errors) are re-surfaced exactly as the
//! persistence layer produced them.

pub mod handling;
pub mod persist;
pub mod translator;

pub use handling::Handling;
pub use persist::Persist;
pub use translator::{Translator, TranslatorBuilder};

pub use dbvet_core::{
    Check, Constraint, ConstraintKind, ConstraintSet, ConstraintViolation, DeclarationError,
    DriverCause, ErrorId, ErrorMessage, Errors, Exclusion, FieldError, ForeignKey, Handler,
    InstanceId, InvalidRecord, NullHandler, ParsedViolation, Record, RecordRef, StatementError,
    Unique, WriteError,
};

/// Commonly used items, for glob import.
pub mod prelude {
    pub use crate::handling::Handling;
    pub use crate::persist::Persist;
    pub use crate::translator::Translator;

    pub use dbvet_core::{
        Check, ConstraintSet, ErrorMessage, Errors, Exclusion, ForeignKey, Record, StatementError,
        Unique, WriteError,
    };
}
