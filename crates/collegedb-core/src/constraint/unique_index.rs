//! Secondary index for enforcing unique constraints.
//!
//! Entries live in the `index:unique` tree and map the constrained values of
//! a row to its identity, enabling duplicate detection without scans.

use crate::catalog::ConstraintDef;
use crate::error::{ConstraintError, Error};
use crate::storage::Transaction;
use crate::value::Row;

/// Index over one unique constraint.
///
/// Key format: `entity\0constraint\0value1\0value2...` -> `id`
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueIndex {
    entity: String,
    constraint: String,
    fields: Vec<String>,
}

impl UniqueIndex {
    /// Create an index for a constraint over `fields` of `entity`.
    pub fn new(
        entity: impl Into<String>,
        constraint: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            entity: entity.into(),
            constraint: constraint.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the index for a unique constraint definition.
    pub fn for_constraint(def: &ConstraintDef) -> Option<Self> {
        match def {
            ConstraintDef::Unique {
                name,
                entity,
                fields,
            } => Some(Self::new(entity.as_str(), name.as_str(), fields.iter().map(String::as_str))),
            ConstraintDef::Check { .. } => None,
        }
    }

    /// Constraint name.
    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    /// Prefix of every index key that belongs to `entity`.
    pub fn entity_prefix(entity: &str) -> Vec<u8> {
        let mut key = entity.as_bytes().to_vec();
        key.push(0);
        key
    }

    /// Values of the constrained fields, or `None` if any is NULL.
    fn values(&self, row: &Row) -> Option<Vec<String>> {
        self.fields
            .iter()
            .map(|f| row.get(f).and_then(|v| v.index_text()))
            .collect()
    }

    fn build_key(&self, values: &[String]) -> Vec<u8> {
        let mut key = Self::entity_prefix(&self.entity);
        key.extend_from_slice(self.constraint.as_bytes());
        for value in values {
            key.push(0);
            key.extend_from_slice(value.as_bytes());
        }
        key
    }

    /// Index key for a row, or `None` when the row is exempt.
    pub fn key_for(&self, row: &Row) -> Option<Vec<u8>> {
        self.values(row).map(|values| self.build_key(&values))
    }

    /// Identity currently holding the row's values, if any.
    pub fn lookup(&self, tx: &Transaction<'_>, row: &Row) -> Result<Option<u64>, Error> {
        match self.key_for(row) {
            Some(key) => tx.index_get(&key),
            None => Ok(None),
        }
    }

    /// Reserve the row's values for `id`.
    ///
    /// Fails if another row already holds the same values.
    pub fn claim(&self, tx: &mut Transaction<'_>, row: &Row, id: u64) -> Result<(), Error> {
        let Some(values) = self.values(row) else {
            return Ok(());
        };
        let key = self.build_key(&values);

        match tx.index_get(&key)? {
            Some(owner) if owner != id => {
                Err(Error::ConstraintViolation(ConstraintError::UniqueConstraintViolation {
                    constraint: self.constraint.clone(),
                    entity: self.entity.clone(),
                    fields: self.fields.clone(),
                    value: values.join(", "),
                }))
            }
            Some(_) => Ok(()),
            None => {
                tx.index_put(key, id);
                Ok(())
            }
        }
    }

    /// Release the row's values if they are held by `id`.
    pub fn release(&self, tx: &mut Transaction<'_>, row: &Row, id: u64) -> Result<(), Error> {
        if let Some(key) = self.key_for(row) {
            if tx.index_get(&key)? == Some(id) {
                tx.index_remove(key);
            }
        }
        Ok(())
    }
}
