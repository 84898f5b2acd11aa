//! Per-record validation error collection.
//!
//! Every record that participates in constraint handling owns an [`Errors`]
//! collection. Besides storing field errors, the collection anchors two kinds
//! of identity that the propagation machinery depends on:
//!
//! - [`InstanceId`] identifies one in-memory record instance. A structured
//!   violation compares instance ids to decide whether it surfaced from the
//!   record currently being handled or from a nested write.
//! - [`ErrorId`] identifies one structured error across imports. When a
//!   nested failure is folded into several ancestors, each ancestor keeps a
//!   copy carrying the same id, so re-importing the same failure is a no-op.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);
static NEXT_ERROR: AtomicU64 = AtomicU64::new(1);

/// Identity of one in-memory record instance.
///
/// Allocated when the record's [`Errors`] collection is created and never
/// reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

/// Identity of one structured field error.
///
/// Preserved by [`Errors::import`], so the same underlying error can be
/// recognized no matter how many ancestor collections it was merged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorId(u64);

/// The message attached to a field error.
///
/// Symbolic codes are the common case; the host's presentation layer is
/// expected to translate them. Literal text is used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    /// Symbolic error code, e.g. `taken` or `invalid`.
    Code(Cow<'static, str>),
    /// Literal human-readable message.
    Text(String),
}

impl ErrorMessage {
    /// Default code for check constraint violations.
    pub const INVALID: Self = Self::Code(Cow::Borrowed("invalid"));
    /// Default code for unique and exclusion constraint violations.
    pub const TAKEN: Self = Self::Code(Cow::Borrowed("taken"));
    /// Default code for foreign key constraint violations.
    pub const REQUIRED: Self = Self::Code(Cow::Borrowed("required"));

    /// A symbolic code.
    pub fn code(code: impl Into<Cow<'static, str>>) -> Self {
        Self::Code(code.into())
    }

    /// A literal message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// The symbolic code, if this message is one.
    pub fn as_code(&self) -> Option<&str> {
        match self {
            Self::Code(code) => Some(code),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Text(text) => write!(f, "{text}"),
        }
    }
}

/// A single structured error attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(skip)]
    id: ErrorId,
    /// The field the error applies to.
    pub field: String,
    /// Symbolic code or literal message.
    pub message: ErrorMessage,
}

impl FieldError {
    /// Identity of this error, preserved across imports.
    pub fn id(&self) -> ErrorId {
        self.id
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation error collection owned by one record instance.
///
/// Not `Clone`: the collection carries the record's identity, and two
/// records must never share one.
#[derive(Debug)]
pub struct Errors {
    instance: InstanceId,
    entries: Vec<FieldError>,
}

impl Errors {
    /// Create an empty collection with a fresh instance identity.
    pub fn new() -> Self {
        Self {
            instance: InstanceId(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed)),
            entries: Vec::new(),
        }
    }

    /// Identity of the record owning this collection.
    pub fn instance_id(&self) -> InstanceId {
        self.instance
    }

    /// Append a new error with a fresh [`ErrorId`] and return it.
    pub fn add(&mut self, field: impl Into<String>, message: ErrorMessage) -> &FieldError {
        self.entries.push(FieldError {
            id: ErrorId(NEXT_ERROR.fetch_add(1, Ordering::Relaxed)),
            field: field.into(),
            message,
        });
        self.entries.last().expect("entry just pushed")
    }

    /// Merge an error produced on another record, keeping its identity.
    pub fn import(&mut self, error: FieldError) {
        self.entries.push(error);
    }

    /// Whether an error with this identity is already present.
    pub fn contains_id(&self, id: ErrorId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// All errors attached to the given field, in insertion order.
    pub fn on<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> {
        self.entries.iter().filter(move |e| e.field == field)
    }

    /// All errors in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all errors. Identity is retained.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Error details grouped by field, in the shape
    /// `{"email": [{"error": "taken"}]}`.
    pub fn details(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for error in &self.entries {
            let entry = serde_json::json!({ "error": error.message });
            map.entry(error.field.clone())
                .or_insert_with(|| serde_json::Value::Array(Vec::new()))
                .as_array_mut()
                .expect("details entries are arrays")
                .push(entry);
        }
        serde_json::Value::Object(map)
    }
}

impl Default for Errors {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
