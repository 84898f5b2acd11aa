//! Public save/destroy operations over a host persistence layer.
//!
//! The engine never talks to a database itself. The host implements
//! [`Persist`] for its record types; the operations here wrap those writes
//! in handling frames and convert translated violations into the
//! documented result shapes:
//!
//! - [`save`](Handling::save): `Ok(false)` on a constraint violation or a
//!   host validation failure, with the record's error collection populated.
//! - [`save_strict`](Handling::save_strict): a constraint violation
//!   surfaces as [`WriteError::Violation`], distinct from a raw driver
//!   failure and always carrying the failing record's identity and field
//!   error. Host validation failures pass through unchanged.
//! - [`destroy`](Handling::destroy): `Ok(false)` iff a constraint blocked
//!   the deletion.
//!
//! Unhandled statement failures are always re-surfaced verbatim as
//! [`WriteError::Statement`].

use dbvet_core::{Record, WriteError};

use crate::handling::Handling;
use crate::translator::Translator;

/// Write operations supplied by the host persistence layer.
///
/// Implementations are expected to reset the record's validation state at
/// the start of each attempt, and to route every cascaded child write
/// through [`Handling::handle_constraints_strict`] on the scope they were
/// given, so failures on nested records are attributed to the right target.
pub trait Persist: Record {
    /// Host-specific write options (e.g. skip-validation flags).
    type Options: Default;

    /// Lenient save. `Ok(false)` with errors populated when the host's own
    /// validations reject the record; `Err(WriteError::Statement)` when the
    /// database rejects a statement.
    fn persist(&mut self, scope: &Handling<'_>, options: &Self::Options)
    -> Result<bool, WriteError>;

    /// Strict save. Host validation failures are returned as
    /// `Err(WriteError::Invalid)`.
    fn persist_strict(
        &mut self,
        scope: &Handling<'_>,
        options: &Self::Options,
    ) -> Result<(), WriteError>;

    /// Delete this record.
    fn delete(&mut self, scope: &Handling<'_>) -> Result<(), WriteError>;
}

impl<'t> Handling<'t> {
    /// Save the record, translating constraint violations into field
    /// errors. `Ok(false)` on violation or validation failure.
    pub fn save<R: Persist>(
        &self,
        record: &mut R,
        options: &R::Options,
    ) -> Result<bool, WriteError> {
        match self.handle_constraints(record, |rec, scope| rec.persist(scope, options))? {
            Some(saved) => Ok(saved),
            None => Ok(false),
        }
    }

    /// Save the record, surfacing constraint violations as
    /// [`WriteError::Violation`].
    pub fn save_strict<R: Persist>(
        &self,
        record: &mut R,
        options: &R::Options,
    ) -> Result<(), WriteError> {
        self.handle_constraints_strict(record, |rec, scope| rec.persist_strict(scope, options))
    }

    /// Destroy the record. `Ok(false)` iff a constraint blocked the
    /// deletion, with the blocking error on the record.
    pub fn destroy<R: Persist>(&self, record: &mut R) -> Result<bool, WriteError> {
        match self.handle_constraints(record, |rec, scope| rec.delete(scope))? {
            Some(()) => Ok(true),
            None => Ok(false),
        }
    }
}

impl Translator {
    /// [`Handling::save`] in a fresh top-level scope.
    pub fn save<R: Persist>(
        &self,
        record: &mut R,
        options: &R::Options,
    ) -> Result<bool, WriteError> {
        self.scope().save(record, options)
    }

    /// [`Handling::save_strict`] in a fresh top-level scope.
    pub fn save_strict<R: Persist>(
        &self,
        record: &mut R,
        options: &R::Options,
    ) -> Result<(), WriteError> {
        self.scope().save_strict(record, options)
    }

    /// [`Handling::destroy`] in a fresh top-level scope.
    pub fn destroy<R: Persist>(&self, record: &mut R) -> Result<bool, WriteError> {
        self.scope().destroy(record)
    }

    /// [`Handling::handle_constraints`] in a fresh top-level scope, for
    /// wrapping arbitrary write operations.
    pub fn handle_constraints<R, T, F>(
        &self,
        record: &mut R,
        write: F,
    ) -> Result<Option<T>, WriteError>
    where
        R: Record,
        F: FnOnce(&mut R, &Handling<'_>) -> Result<T, WriteError>,
    {
        self.scope().handle_constraints(record, write)
    }

    /// [`Handling::handle_constraints_strict`] in a fresh top-level scope.
    pub fn handle_constraints_strict<R, T, F>(
        &self,
        record: &mut R,
        write: F,
    ) -> Result<T, WriteError>
    where
        R: Record,
        F: FnOnce(&mut R, &Handling<'_>) -> Result<T, WriteError>,
    {
        self.scope().handle_constraints_strict(record, write)
    }
}
