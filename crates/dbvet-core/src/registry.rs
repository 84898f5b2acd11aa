//! Per-record-type constraint registry.
//!
//! A [`ConstraintSet`] is built once, at record-type definition time, and is
//! read-only afterwards, typically stored in a `OnceLock` static and shared
//! freely across threads. Inheritance is an explicit parent pointer: lookups
//! fall back to the parent chain, while registrations always land in the
//! child set, so sibling types never observe each other's constraints.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::constraint::{Check, Constraint, Exclusion, ForeignKey, Unique};
use crate::error::DeclarationError;

/// Constraints declared for one record type, keyed by database name.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    table: String,
    by_name: BTreeMap<String, Constraint>,
    parent: Option<Arc<ConstraintSet>>,
}

impl ConstraintSet {
    /// An empty set for the given table.
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            by_name: BTreeMap::new(),
            parent: None,
        }
    }

    /// An empty set inheriting every constraint of `parent`.
    pub fn inheriting(table: impl Into<String>, parent: Arc<ConstraintSet>) -> Self {
        Self {
            table: table.into(),
            by_name: BTreeMap::new(),
            parent: Some(parent),
        }
    }

    /// The table whose constraints this set describes.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Find a constraint by database name, searching the parent chain.
    pub fn lookup(&self, name: &str) -> Option<&Constraint> {
        self.by_name
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.lookup(name)))
    }

    /// Whether a constraint with this name exists anywhere in the chain.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// All constraints visible to this set: own first, then inherited.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        let mut sets = vec![self];
        let mut parent = self.parent.as_deref();
        while let Some(set) = parent {
            sets.push(set);
            parent = set.parent.as_deref();
        }
        sets.into_iter().flat_map(|s| s.by_name.values())
    }

    /// Number of visible constraints, inherited included.
    pub fn len(&self) -> usize {
        self.by_name.len() + self.parent.as_ref().map_or(0, |p| p.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Track a check constraint and translate its violations into
    /// validation errors on the declared key.
    pub fn check_constraint(&mut self, decl: Check) -> Result<&Constraint, DeclarationError> {
        let constraint = decl.resolve(&self.table)?;
        self.insert(constraint)
    }

    /// Track an exclusion constraint and translate its violations into
    /// validation errors on the declared key.
    pub fn exclusion_constraint(
        &mut self,
        decl: Exclusion,
    ) -> Result<&Constraint, DeclarationError> {
        let constraint = decl.resolve(&self.table)?;
        self.insert(constraint)
    }

    /// Track a foreign key constraint and translate its violations into
    /// validation errors on the error key.
    pub fn foreign_key_constraint(
        &mut self,
        decl: ForeignKey,
    ) -> Result<&Constraint, DeclarationError> {
        let constraint = decl.resolve(&self.table)?;
        self.insert(constraint)
    }

    /// Track a uniqueness constraint and translate its violations into
    /// validation errors on the error key.
    pub fn unique_constraint(&mut self, decl: Unique) -> Result<&Constraint, DeclarationError> {
        let constraint = decl.resolve(&self.table)?;
        self.insert(constraint)
    }

    fn insert(&mut self, constraint: Constraint) -> Result<&Constraint, DeclarationError> {
        if self.contains(constraint.name()) {
            return Err(DeclarationError::DuplicateName {
                name: constraint.name().to_string(),
            });
        }
        debug!(
            table = %self.table,
            kind = %constraint.kind(),
            name = %constraint.name(),
            "registered constraint"
        );
        let name = constraint.name().to_string();
        Ok(self.by_name.entry(name).or_insert(constraint))
    }
}
