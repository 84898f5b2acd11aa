//! The handling scope: dispatch, reentrancy, and nested error import.
//!
//! A [`Handling`] value is the explicit per-call-stack context for one
//! logical write operation. It carries the translator's handler list and a
//! depth counter that marks whether constraint handling is active. Nested
//! writes, meaning children persisted as a side effect of saving a parent,
//! are wrapped in their own frames on the same scope, so a failure surfacing
//! from a child is translated at the child's frame and then imported into
//! each ancestor's error collection on the way up, exactly once per
//! ancestor.

use std::cell::Cell;

use tracing::{debug, warn};

use dbvet_core::{
    ConstraintViolation, FieldError, Handler, ParsedViolation, Record, RecordRef, StatementError,
    WriteError,
};

/// Scoped reentrancy counter. Increments on construction and decrements on
/// drop, so the depth is restored on every exit path, panic included.
struct DepthGuard<'a> {
    depth: &'a Cell<u32>,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<u32>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

/// Per-operation handling context.
///
/// Obtained from [`Translator::scope`](crate::Translator::scope) and
/// threaded by reference through the write call chain. Not `Sync`: one
/// scope belongs to one call stack.
pub struct Handling<'t> {
    handlers: &'t [Box<dyn Handler>],
    depth: Cell<u32>,
}

impl<'t> Handling<'t> {
    pub(crate) fn new(handlers: &'t [Box<dyn Handler>]) -> Self {
        Self {
            handlers,
            depth: Cell::new(0),
        }
    }

    /// Whether constraint handling is currently active on this scope.
    pub fn is_active(&self) -> bool {
        self.depth.get() > 0
    }

    /// Current nesting depth. Zero outside any handled write.
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// Run `write` with constraint handling; a translated violation
    /// propagates as [`WriteError::Violation`].
    ///
    /// The thunk receives the record and this scope, so cascaded child
    /// writes can be wrapped in nested frames. On a raw statement failure
    /// surfacing in this frame, the handlers are consulted in priority
    /// order; a match attaches the constraint's error to the failing
    /// record and converts the failure into a structured violation. A
    /// violation arriving from a nested frame is imported into this
    /// frame's record (unless it surfaced from this very record) and
    /// re-propagated. Unrecognized failures and host validation failures
    /// pass through untouched.
    pub fn handle_constraints_strict<R, T, F>(
        &self,
        record: &mut R,
        write: F,
    ) -> Result<T, WriteError>
    where
        R: Record,
        F: FnOnce(&mut R, &Handling<'t>) -> Result<T, WriteError>,
    {
        let result = {
            let _guard = DepthGuard::enter(&self.depth);
            self.write_frame(record, write)
        };

        match result {
            Err(WriteError::Violation(violation)) => {
                // A violation surfacing from the frame's own record has
                // already been attached by Constraint::apply.
                if violation.record().instance() != record.instance_id() {
                    self.import(record, &violation);
                }
                Err(WriteError::Violation(violation))
            }
            other => other,
        }
    }

    /// [`handle_constraints_strict`](Self::handle_constraints_strict) with
    /// the violation swallowed: `Ok(None)` signals "not successful" and the
    /// record's error collection holds the details.
    ///
    /// Only the top level of a logical write should swallow; nested frames
    /// must use the strict form so violations keep propagating.
    pub fn handle_constraints<R, T, F>(
        &self,
        record: &mut R,
        write: F,
    ) -> Result<Option<T>, WriteError>
    where
        R: Record,
        F: FnOnce(&mut R, &Handling<'t>) -> Result<T, WriteError>,
    {
        match self.handle_constraints_strict(record, write) {
            Ok(value) => Ok(Some(value)),
            Err(WriteError::Violation(violation)) => {
                debug!(%violation, "constraint violation converted to unsuccessful result");
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    /// One write frame: run the thunk and translate a raw failure that
    /// surfaced here into a violation bound to this frame's record.
    fn write_frame<R, T, F>(&self, record: &mut R, write: F) -> Result<T, WriteError>
    where
        R: Record,
        F: FnOnce(&mut R, &Handling<'t>) -> Result<T, WriteError>,
    {
        match write(record, self) {
            Err(WriteError::Statement(raw)) => {
                // Handling not active: the failure reached us outside any
                // guarded frame and must propagate raw.
                if !self.is_active() {
                    return Err(WriteError::Statement(raw));
                }
                match self.translate(&raw, record) {
                    Some(error) => {
                        let record_ref =
                            RecordRef::new(record.instance_id(), record.table_name());
                        Err(WriteError::Violation(ConstraintViolation::new(
                            record_ref, error, raw,
                        )))
                    }
                    None => Err(WriteError::Statement(raw)),
                }
            }
            other => other,
        }
    }

    /// Ask the responsible handler to resolve the failure against the
    /// failing record's registry. `None` leaves the failure unhandled.
    fn translate(&self, err: &StatementError, record: &mut dyn Record) -> Option<FieldError> {
        let handler = self.handlers.iter().find(|h| h.can_handle(err))?;

        match handler.parse(err, &*record) {
            ParsedViolation::Constraint { kind, name } => {
                let Some(constraint) = record.constraints().lookup(&name).cloned() else {
                    debug!(
                        handler = handler.name(),
                        constraint = %name,
                        "parsed constraint not registered; failure stays unhandled"
                    );
                    return None;
                };
                if constraint.kind() != kind {
                    warn!(
                        constraint = %name,
                        registered = %constraint.kind(),
                        reported = %kind,
                        "constraint kind mismatch between registry and driver"
                    );
                }
                debug!(
                    handler = handler.name(),
                    constraint = %name,
                    field = %constraint.error_key(),
                    "translated constraint violation"
                );
                Some(constraint.apply(record.errors_mut()))
            }
            ParsedViolation::Unrecognized => None,
        }
    }

    /// Fold a nested violation's error into `record`, skipping errors
    /// already imported at this level.
    fn import<R: Record>(&self, record: &mut R, violation: &ConstraintViolation) {
        let error = violation.error();
        if record.errors().contains_id(error.id()) {
            return;
        }
        record.errors_mut().import(error.clone());
    }
}
