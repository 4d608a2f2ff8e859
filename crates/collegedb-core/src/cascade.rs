//! Cascade executor for handling referential integrity on deletes.
//!
//! This module implements the delete behavior of every relation that
//! targets the row being deleted:
//! - CASCADE: Delete related rows recursively
//! - RESTRICT: Prevent deletion if related rows exist
//! - SET NULL: Set foreign key fields to null on related rows

use std::collections::HashSet;

use crate::catalog::{DeleteBehavior, RelationDef};
use crate::constraint::ConstraintValidator;
use crate::error::{CascadeError, ConstraintError, Error};
use crate::storage::Transaction;
use crate::value::{Row, Value};

/// Maximum cascade depth to prevent runaway recursion.
const MAX_CASCADE_DEPTH: usize = 100;

/// Result of a cascade operation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CascadeResult {
    /// Rows that were deleted as dependents (entity, id).
    pub deleted_entities: Vec<(String, u64)>,
    /// Fields that were set to null (entity, id, field).
    pub nullified_fields: Vec<(String, u64, String)>,
}

impl CascadeResult {
    /// Create an empty cascade result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of affected rows.
    pub fn affected_count(&self) -> usize {
        self.deleted_entities.len() + self.nullified_fields.len()
    }

    /// Number of dependent rows of `entity` that were deleted.
    pub fn deleted_of(&self, entity: &str) -> usize {
        self.deleted_entities
            .iter()
            .filter(|(e, _)| e == entity)
            .count()
    }
}

/// Executes cascade operations for delete.
pub struct CascadeExecutor<'a> {
    validator: &'a ConstraintValidator<'a>,
}

impl<'a> CascadeExecutor<'a> {
    /// Create a new cascade executor.
    pub fn new(validator: &'a ConstraintValidator<'a>) -> Self {
        Self { validator }
    }

    /// Process the dependents of a row that is about to be deleted.
    ///
    /// The root row itself is left to the caller. Any restrict violation
    /// fails the whole operation; the transaction must then be dropped.
    pub fn process_delete(
        &self,
        entity: &str,
        id: u64,
        tx: &mut Transaction<'_>,
    ) -> Result<CascadeResult, Error> {
        let mut result = CascadeResult::new();
        let mut visited = HashSet::new();
        visited.insert((entity.to_string(), id));

        self.process_delete_recursive(entity, id, tx, &mut result, &mut visited, 0)?;

        Ok(result)
    }

    /// Recursively process cascades.
    fn process_delete_recursive(
        &self,
        entity: &str,
        id: u64,
        tx: &mut Transaction<'_>,
        result: &mut CascadeResult,
        visited: &mut HashSet<(String, u64)>,
        depth: usize,
    ) -> Result<(), Error> {
        if depth > MAX_CASCADE_DEPTH {
            return Err(CascadeError::MaxDepthExceeded { depth }.into());
        }

        let schema = self.validator.schema();

        for relation in schema.relations_to(entity) {
            let referencing = self.find_referencing_rows(tx, relation, id)?;
            if referencing.is_empty() {
                continue;
            }

            match relation.on_delete {
                DeleteBehavior::Restrict => {
                    return Err(ConstraintError::RestrictedDeleteViolation {
                        constraint: relation.name.clone(),
                        entity: entity.to_string(),
                        id,
                        referencing_entity: relation.from_entity.clone(),
                        count: referencing.len(),
                    }
                    .into());
                }
                DeleteBehavior::Cascade => {
                    for (ref_id, row) in referencing {
                        if !visited.insert((relation.from_entity.clone(), ref_id)) {
                            continue;
                        }

                        self.process_delete_recursive(
                            &relation.from_entity,
                            ref_id,
                            tx,
                            result,
                            visited,
                            depth + 1,
                        )?;

                        self.validator
                            .release_row(tx, &relation.from_entity, ref_id, &row)?;
                        tx.delete(relation.from_entity.as_str(), ref_id);
                        result
                            .deleted_entities
                            .push((relation.from_entity.clone(), ref_id));
                    }
                }
                DeleteBehavior::SetNull => {
                    for (ref_id, row) in referencing {
                        self.set_field_null(tx, relation, ref_id, row)?;
                        result.nullified_fields.push((
                            relation.from_entity.clone(),
                            ref_id,
                            relation.from_field.clone(),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Find all rows of the relation's source entity that reference `target_id`.
    fn find_referencing_rows(
        &self,
        tx: &Transaction<'_>,
        relation: &RelationDef,
        target_id: u64,
    ) -> Result<Vec<(u64, Row)>, Error> {
        let mut referencing = Vec::new();

        for (id, record) in tx.scan(&relation.from_entity)? {
            let row = Row::from_bytes(&record.data)?;
            if row.get(&relation.from_field).and_then(Value::as_id) == Some(target_id) {
                referencing.push((id, row));
            }
        }

        Ok(referencing)
    }

    /// Set a foreign key field to null on a row.
    fn set_field_null(
        &self,
        tx: &mut Transaction<'_>,
        relation: &RelationDef,
        id: u64,
        mut row: Row,
    ) -> Result<(), Error> {
        let Some(record) = tx.read(&relation.from_entity, id)? else {
            return Ok(());
        };

        let old = row.clone();
        row.set(relation.from_field.clone(), Value::Null);
        self.validator
            .reindex(tx, &relation.from_entity, id, &old, &row)?;
        tx.put(relation.from_entity.as_str(), id, record.updated(row.to_bytes()?));

        Ok(())
    }
}
