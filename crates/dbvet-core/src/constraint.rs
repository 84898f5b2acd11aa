//! Constraint metadata.
//!
//! A [`Constraint`] describes one database-level rule and the validation
//! error its violation should produce. Constraints are declared through the
//! kind-specific specs ([`Check`], [`Unique`], [`Exclusion`],
//! [`ForeignKey`]) and resolved into immutable values when registered with
//! a [`ConstraintSet`](crate::registry::ConstraintSet).

use std::fmt;

use serde::Serialize;

use crate::error::DeclarationError;
use crate::errors::{ErrorMessage, Errors, FieldError};
use crate::naming;

/// The four constraint kinds the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// CHECK constraint over one key.
    Check,
    /// Unique index or UNIQUE constraint over one or more keys.
    Unique,
    /// EXCLUDE constraint over one key.
    Exclusion,
    /// FOREIGN KEY constraint over one or more keys.
    ForeignKey,
}

impl ConstraintKind {
    /// Default symbolic message code for violations of this kind.
    pub fn default_message(self) -> ErrorMessage {
        match self {
            Self::Check => ErrorMessage::INVALID,
            Self::Unique | Self::Exclusion => ErrorMessage::TAKEN,
            Self::ForeignKey => ErrorMessage::REQUIRED,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Check => "check",
            Self::Unique => "unique",
            Self::Exclusion => "exclusion",
            Self::ForeignKey => "foreign key",
        };
        write!(f, "{label}")
    }
}

/// One declared database constraint, resolved and immutable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constraint {
    kind: ConstraintKind,
    name: String,
    keys: Vec<String>,
    error_key: String,
    message: ErrorMessage,
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// The database-visible constraint identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered keys the constraint covers. Never empty.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The field validation errors are attached to.
    pub fn error_key(&self) -> &str {
        &self.error_key
    }

    pub fn message(&self) -> &ErrorMessage {
        &self.message
    }

    /// Attach this constraint's error to a record's collection and return a
    /// copy carrying the same identity.
    pub fn apply(&self, errors: &mut Errors) -> FieldError {
        errors
            .add(self.error_key.clone(), self.message.clone())
            .clone()
    }
}

fn into_keys<I, K>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    keys.into_iter().map(Into::into).collect()
}

/// Declaration of a check constraint.
#[derive(Debug, Clone)]
pub struct Check {
    key: String,
    name: Option<String>,
    message: Option<ErrorMessage>,
}

impl Check {
    /// Declare a check constraint on `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            message: None,
        }
    }

    /// Explicit constraint name; inferred from the table and key otherwise.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Error message override; defaults to the `invalid` code.
    pub fn message(mut self, message: ErrorMessage) -> Self {
        self.message = Some(message);
        self
    }

    pub(crate) fn resolve(self, table: &str) -> Result<Constraint, DeclarationError> {
        let name = self
            .name
            .unwrap_or_else(|| naming::check_name(table, &self.key));
        Ok(Constraint {
            kind: ConstraintKind::Check,
            name,
            error_key: self.key.clone(),
            keys: vec![self.key],
            message: self
                .message
                .unwrap_or_else(|| ConstraintKind::Check.default_message()),
        })
    }
}

/// Declaration of an exclusion constraint.
#[derive(Debug, Clone)]
pub struct Exclusion {
    key: String,
    name: Option<String>,
    message: Option<ErrorMessage>,
}

impl Exclusion {
    /// Declare an exclusion constraint on `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            message: None,
        }
    }

    /// Explicit constraint name; inferred from the table and key otherwise.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Error message override; defaults to the `taken` code.
    pub fn message(mut self, message: ErrorMessage) -> Self {
        self.message = Some(message);
        self
    }

    pub(crate) fn resolve(self, table: &str) -> Result<Constraint, DeclarationError> {
        let name = self
            .name
            .unwrap_or_else(|| naming::exclusion_name(table, &self.key));
        Ok(Constraint {
            kind: ConstraintKind::Exclusion,
            name,
            error_key: self.key.clone(),
            keys: vec![self.key],
            message: self
                .message
                .unwrap_or_else(|| ConstraintKind::Exclusion.default_message()),
        })
    }
}

/// Declaration of a foreign key constraint.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    keys: Vec<String>,
    name: Option<String>,
    message: Option<ErrorMessage>,
    error_key: Option<String>,
}

impl ForeignKey {
    /// Declare a foreign key constraint over `keys`.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: into_keys(keys),
            name: None,
            message: None,
            error_key: None,
        }
    }

    /// Explicit constraint name; inferred from the table and keys otherwise.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Error message override; defaults to the `required` code.
    pub fn message(mut self, message: ErrorMessage) -> Self {
        self.message = Some(message);
        self
    }

    /// Field to attach errors to; defaults to the first key.
    pub fn error_key(mut self, error_key: impl Into<String>) -> Self {
        self.error_key = Some(error_key.into());
        self
    }

    pub(crate) fn resolve(self, table: &str) -> Result<Constraint, DeclarationError> {
        if self.keys.is_empty() {
            return Err(DeclarationError::EmptyKeys {
                kind: ConstraintKind::ForeignKey,
            });
        }
        let name = self
            .name
            .unwrap_or_else(|| naming::foreign_key_name(table, &self.keys));
        let error_key = self.error_key.unwrap_or_else(|| self.keys[0].clone());
        Ok(Constraint {
            kind: ConstraintKind::ForeignKey,
            name,
            keys: self.keys,
            error_key,
            message: self
                .message
                .unwrap_or_else(|| ConstraintKind::ForeignKey.default_message()),
        })
    }
}

/// Declaration of a uniqueness constraint.
#[derive(Debug, Clone)]
pub struct Unique {
    keys: Vec<String>,
    name: Option<String>,
    message: Option<ErrorMessage>,
    error_key: Option<String>,
}

impl Unique {
    /// Declare a uniqueness constraint over `keys`.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: into_keys(keys),
            name: None,
            message: None,
            error_key: None,
        }
    }

    /// Explicit constraint name; inferred from the table and keys otherwise.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Error message override; defaults to the `taken` code.
    pub fn message(mut self, message: ErrorMessage) -> Self {
        self.message = Some(message);
        self
    }

    /// Field to attach errors to; defaults to the first key.
    pub fn error_key(mut self, error_key: impl Into<String>) -> Self {
        self.error_key = Some(error_key.into());
        self
    }

    pub(crate) fn resolve(self, table: &str) -> Result<Constraint, DeclarationError> {
        if self.keys.is_empty() {
            return Err(DeclarationError::EmptyKeys {
                kind: ConstraintKind::Unique,
            });
        }
        let name = self
            .name
            .unwrap_or_else(|| naming::unique_index_name(table, &self.keys));
        let error_key = self.error_key.unwrap_or_else(|| self.keys[0].clone());
        Ok(Constraint {
            kind: ConstraintKind::Unique,
            name,
            keys: self.keys,
            error_key,
            message: self
                .message
                .unwrap_or_else(|| ConstraintKind::Unique.default_message()),
        })
    }
}
