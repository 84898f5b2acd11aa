//! Core types and traits for dbvet constraint translation.
//!
//! This crate provides the foundational abstractions for turning database
//! constraint violations into per-field validation errors:
//!
//! - `Constraint` and the kind-specific declaration specs
//! - `ConstraintSet` registry, one per record type
//! - Deterministic constraint-name inference
//! - `Errors` collection with instance and error identity
//! - `StatementError` raw failures and the engine's error taxonomy
//! - `Handler` contract implemented by the dialect crates

pub mod constraint;
pub mod error;
pub mod errors;
pub mod handler;
pub mod naming;
pub mod record;
pub mod registry;
pub mod statement;

pub use constraint::{Check, Constraint, ConstraintKind, Exclusion, ForeignKey, Unique};
pub use error::{
    ConstraintViolation, DeclarationError, InvalidRecord, RecordRef, WriteError,
};
pub use errors::{ErrorId, ErrorMessage, Errors, FieldError, InstanceId};
pub use handler::{Handler, NullHandler, ParsedViolation};
pub use naming::MAX_IDENTIFIER_BYTES;
pub use record::Record;
pub use registry::ConstraintSet;
pub use statement::{DriverCause, SQLITE_CONSTRAINT, StatementError, sqlite_code, sqlstate};
