//! The record interface constraint handling operates on.

use crate::errors::{Errors, InstanceId};
use crate::registry::ConstraintSet;

/// A persisted record that participates in constraint handling.
///
/// The host persistence layer implements this for its model types. The
/// engine needs only four things: the table name, the type's constraint
/// registry, and read/write access to the record's error collection.
///
/// The trait is object-safe; handlers receive records as `&dyn Record`.
pub trait Record {
    /// Name of the database table backing this record's type.
    fn table_name(&self) -> &str;

    /// The constraint registry declared for this record's type.
    fn constraints(&self) -> &ConstraintSet;

    /// The record's validation error collection.
    fn errors(&self) -> &Errors;

    fn errors_mut(&mut self) -> &mut Errors;

    /// Identity of this in-memory instance.
    fn instance_id(&self) -> InstanceId {
        self.errors().instance_id()
    }
}
