//! Constraint validation logic.
//!
//! The ConstraintValidator checks every rule of an entity during insert and
//! update, and keeps the unique index in step with the rows it admits.

use crate::catalog::{ConstraintDef, EntityDef, ScalarType, SchemaBundle};
use crate::error::{ConstraintError, Error};
use crate::storage::Transaction;
use crate::value::{Row, Value};

use super::check::CheckEvaluator;
use super::unique_index::UniqueIndex;

/// Constraint validator for enforcing schema rules.
pub struct ConstraintValidator<'a> {
    schema: &'a SchemaBundle,
    enforce_checks: bool,
}

impl<'a> ConstraintValidator<'a> {
    /// Create a new constraint validator.
    pub fn new(schema: &'a SchemaBundle, enforce_checks: bool) -> Self {
        Self {
            schema,
            enforce_checks,
        }
    }

    /// The schema the validator enforces.
    pub fn schema(&self) -> &'a SchemaBundle {
        self.schema
    }

    /// Fill schema defaults for fields missing from an insert.
    pub fn apply_defaults(&self, entity: &EntityDef, row: &mut Row) {
        for field in &entity.fields {
            if row.contains(&field.name) {
                continue;
            }
            if let Some(default) = &field.default {
                row.set(field.name.clone(), default.to_value());
            }
        }
    }

    /// Validate a new row and claim its unique values.
    ///
    /// Checks:
    /// - Field names, value types and NOT NULL
    /// - Foreign keys (referenced rows must exist, NULL allowed)
    /// - Unique constraints
    /// - Check constraints, when enabled
    pub fn validate_insert(
        &self,
        tx: &mut Transaction<'_>,
        entity: &EntityDef,
        id: u64,
        row: &Row,
    ) -> Result<(), Error> {
        self.check_shape(entity, row)?;

        for relation in self.schema.relations_from(&entity.name) {
            self.check_foreign_key(
                tx,
                entity,
                &relation.name,
                &relation.from_field,
                &relation.to_entity,
                row,
            )?;
        }

        for constraint in self.schema.constraints_for(&entity.name) {
            match constraint {
                ConstraintDef::Unique { .. } => {
                    if let Some(index) = UniqueIndex::for_constraint(constraint) {
                        index.claim(tx, row, id)?;
                    }
                }
                ConstraintDef::Check { .. } => self.check_value(constraint, row)?,
            }
        }

        Ok(())
    }

    /// Validate an updated row against its previous state.
    ///
    /// Foreign keys and unique constraints are re-checked only when one of
    /// their fields changed; shape and checks always apply to the merged row.
    pub fn validate_update(
        &self,
        tx: &mut Transaction<'_>,
        entity: &EntityDef,
        id: u64,
        old: &Row,
        new: &Row,
    ) -> Result<(), Error> {
        self.check_shape(entity, new)?;

        let changed = |field: &str| old.get(field) != new.get(field);

        for relation in self.schema.relations_from(&entity.name) {
            if changed(relation.from_field.as_str()) {
                self.check_foreign_key(
                    tx,
                    entity,
                    &relation.name,
                    &relation.from_field,
                    &relation.to_entity,
                    new,
                )?;
            }
        }

        for constraint in self.schema.constraints_for(&entity.name) {
            self.check_value(constraint, new)?;
        }

        self.reindex(tx, &entity.name, id, old, new)
    }

    /// Move unique index entries of a row whose constrained values changed.
    pub fn reindex(
        &self,
        tx: &mut Transaction<'_>,
        entity: &str,
        id: u64,
        old: &Row,
        new: &Row,
    ) -> Result<(), Error> {
        for constraint in self.schema.constraints_for(entity) {
            let ConstraintDef::Unique { fields, .. } = constraint else {
                continue;
            };
            if fields.iter().all(|f| old.get(f) == new.get(f)) {
                continue;
            }
            if let Some(index) = UniqueIndex::for_constraint(constraint) {
                index.release(tx, old, id)?;
                index.claim(tx, new, id)?;
            }
        }
        Ok(())
    }

    /// Release every unique value held by a row that is being removed.
    pub fn release_row(
        &self,
        tx: &mut Transaction<'_>,
        entity: &str,
        id: u64,
        row: &Row,
    ) -> Result<(), Error> {
        for constraint in self.schema.constraints_for(entity) {
            if let Some(index) = UniqueIndex::for_constraint(constraint) {
                index.release(tx, row, id)?;
            }
        }
        Ok(())
    }

    /// Check field names, value types, NOT NULL and (when enabled) column widths.
    fn check_shape(&self, entity: &EntityDef, row: &Row) -> Result<(), Error> {
        for (name, value) in row.iter() {
            let Some(field) = entity.get_field(name) else {
                if name == &entity.identity_field {
                    return Err(Error::ImmutableField {
                        entity: entity.name.clone(),
                        field: name.clone(),
                    });
                }
                return Err(Error::InvalidData(format!(
                    "{} has no field {}",
                    entity.name, name
                )));
            };
            if !field.scalar.accepts(value) {
                return Err(Error::InvalidData(format!(
                    "{}.{} expects {}, got {}",
                    entity.name,
                    name,
                    field.scalar.sql_name(),
                    value.type_name()
                )));
            }
            if self.enforce_checks {
                if let (ScalarType::String { max_len }, Value::Text(s)) = (&field.scalar, value) {
                    if s.chars().count() > *max_len as usize {
                        return Err(Error::ConstraintViolation(ConstraintError::CheckViolation {
                            constraint: format!("{}_{}_length", entity.name, name),
                            entity: entity.name.clone(),
                            detail: format!("LENGTH({name}) <= {max_len}"),
                        }));
                    }
                }
            }
        }

        for field in &entity.fields {
            if !field.nullable && row.get(&field.name).map_or(true, Value::is_null) {
                return Err(Error::ConstraintViolation(ConstraintError::NotNullViolation {
                    entity: entity.name.clone(),
                    field: field.name.clone(),
                }));
            }
        }

        Ok(())
    }

    /// Check a foreign key (a NULL reference is allowed).
    fn check_foreign_key(
        &self,
        tx: &Transaction<'_>,
        entity: &EntityDef,
        constraint: &str,
        field: &str,
        referenced_entity: &str,
        row: &Row,
    ) -> Result<(), Error> {
        let referenced_id = match row.get(field) {
            None | Some(Value::Null) => return Ok(()),
            Some(value) => value.as_id(),
        };

        let exists = match referenced_id {
            Some(id) => tx.exists(referenced_entity, id)?,
            None => false,
        };

        if exists {
            return Ok(());
        }

        Err(Error::ConstraintViolation(ConstraintError::ForeignKeyViolation {
            constraint: constraint.to_string(),
            entity: entity.name.clone(),
            field: field.to_string(),
            referenced_entity: referenced_entity.to_string(),
            value: referenced_id.unwrap_or_default(),
        }))
    }

    /// Evaluate a check constraint when enforcement is enabled.
    fn check_value(&self, constraint: &ConstraintDef, row: &Row) -> Result<(), Error> {
        if !self.enforce_checks {
            return Ok(());
        }
        let ConstraintDef::Check { name, entity, check } = constraint else {
            return Ok(());
        };

        match CheckEvaluator::evaluate(check, row) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::ConstraintViolation(ConstraintError::CheckViolation {
                constraint: name.clone(),
                entity: entity.clone(),
                detail: check.describe(),
            })),
            Err(e) => Err(Error::InvalidData(format!(
                "check constraint '{name}' evaluation failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CheckExpr, DefaultValue, DeleteBehavior, FieldDef, RelationDef};
    use crate::storage::{Record, StorageConfig, StorageEngine};

    fn schema() -> SchemaBundle {
        let departments = EntityDef::new("departments", "department_id")
            .with_field(FieldDef::new("department_name", ScalarType::String { max_len: 100 }));
        let courses = EntityDef::new("courses", "course_id")
            .with_field(FieldDef::new("course_code", ScalarType::String { max_len: 20 }))
            .with_field(FieldDef::new("department_id", ScalarType::Int64))
            .with_field(FieldDef::optional("room_number", ScalarType::String { max_len: 20 }))
            .with_field(
                FieldDef::new("credits", ScalarType::Int32).with_default(DefaultValue::Int(3)),
            );

        SchemaBundle::new(1)
            .with_entity(departments)
            .with_entity(courses)
            .with_relation(
                RelationDef::one_to_many(
                    "courses_department_fk",
                    "courses",
                    "department_id",
                    "departments",
                )
                .with_on_delete(DeleteBehavior::Restrict),
            )
            .with_constraint(ConstraintDef::unique(
                "courses_code_unique",
                "courses",
                "course_code",
            ))
            .with_constraint(ConstraintDef::check(
                "courses_credits_range",
                "courses",
                CheckExpr::Range {
                    field: "credits".into(),
                    min: 1.0,
                    max: Some(10.0),
                },
            ))
    }

    fn setup() -> (StorageEngine, SchemaBundle) {
        let engine = StorageEngine::open(StorageConfig::temporary()).unwrap();
        let mut tx = engine.transaction();
        tx.put(
            "departments",
            1,
            Record::new(Row::new().with("department_name", "Mathematics").to_bytes().unwrap()),
        );
        tx.commit().unwrap();
        (engine, schema())
    }

    fn course(code: &str, department_id: i64) -> Row {
        Row::new()
            .with("course_code", code)
            .with("department_id", department_id)
    }

    #[test]
    fn test_defaults() {
        let schema = schema();
        let validator = ConstraintValidator::new(&schema, false);
        let entity = schema.get_entity("courses").unwrap();

        let mut row = course("MATH101", 1);
        validator.apply_defaults(entity, &mut row);
        assert_eq!(row.get("credits"), Some(&Value::Int(3)));

        let mut explicit = course("MATH102", 1).with("credits", 4);
        validator.apply_defaults(entity, &mut explicit);
        assert_eq!(explicit.get("credits"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_insert_foreign_key() {
        let (engine, schema) = setup();
        let validator = ConstraintValidator::new(&schema, false);
        let entity = schema.get_entity("courses").unwrap();
        let mut tx = engine.transaction();

        let mut ok = course("MATH101", 1);
        validator.apply_defaults(entity, &mut ok);
        validator.validate_insert(&mut tx, entity, 1, &ok).unwrap();

        let mut dangling = course("MATH999", 99);
        validator.apply_defaults(entity, &mut dangling);
        let err = validator
            .validate_insert(&mut tx, entity, 2, &dangling)
            .unwrap_err();
        assert!(err.is_foreign_key_violation());
    }

    #[test]
    fn test_insert_not_null_and_unknown_field() {
        let (engine, schema) = setup();
        let validator = ConstraintValidator::new(&schema, false);
        let entity = schema.get_entity("courses").unwrap();
        let mut tx = engine.transaction();

        let missing = Row::new().with("course_code", "X1").with("credits", 3);
        assert!(validator
            .validate_insert(&mut tx, entity, 1, &missing)
            .unwrap_err()
            .is_not_null_violation());

        let unknown = course("X2", 1).with("credits", 3).with("lecturer", "Smith");
        assert!(matches!(
            validator.validate_insert(&mut tx, entity, 1, &unknown),
            Err(Error::InvalidData(_))
        ));

        let identity = course("X3", 1).with("credits", 3).with("course_id", 5);
        assert!(matches!(
            validator.validate_insert(&mut tx, entity, 1, &identity),
            Err(Error::ImmutableField { .. })
        ));

        let wrong_type = course("X4", 1).with("credits", "three");
        assert!(matches!(
            validator.validate_insert(&mut tx, entity, 1, &wrong_type),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_insert_unique() {
        let (engine, schema) = setup();
        let validator = ConstraintValidator::new(&schema, false);
        let entity = schema.get_entity("courses").unwrap();
        let mut tx = engine.transaction();

        let row = course("MATH101", 1).with("credits", 4);
        validator.validate_insert(&mut tx, entity, 1, &row).unwrap();
        let err = validator.validate_insert(&mut tx, entity, 2, &row).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_update_moves_unique_value() {
        let (engine, schema) = setup();
        let validator = ConstraintValidator::new(&schema, false);
        let entity = schema.get_entity("courses").unwrap();
        let mut tx = engine.transaction();

        let old = course("MATH101", 1).with("credits", 4);
        validator.validate_insert(&mut tx, entity, 1, &old).unwrap();

        let new = course("MATH110", 1).with("credits", 4);
        validator.validate_update(&mut tx, entity, 1, &old, &new).unwrap();

        // old code is free again, new code is taken
        validator.validate_insert(&mut tx, entity, 2, &old).unwrap();
        assert!(validator
            .validate_insert(&mut tx, entity, 3, &new)
            .unwrap_err()
            .is_unique_violation());
    }

    #[test]
    fn test_checks_only_when_enabled() {
        let (engine, schema) = setup();
        let entity = schema.get_entity("courses").unwrap();
        let row = course("MATH101", 1).with("credits", 40);

        let mut tx = engine.transaction();
        ConstraintValidator::new(&schema, false)
            .validate_insert(&mut tx, entity, 1, &row)
            .unwrap();

        let mut tx = engine.transaction();
        let err = ConstraintValidator::new(&schema, true)
            .validate_insert(&mut tx, entity, 1, &row)
            .unwrap_err();
        assert!(err.is_check_violation());
    }

    #[test]
    fn test_column_width_when_enabled() {
        let (engine, schema) = setup();
        let entity = schema.get_entity("courses").unwrap();
        let row = course("MATH101", 1)
            .with("credits", 4)
            .with("room_number", "B-201-and-a-very-long-suffix");

        let mut tx = engine.transaction();
        ConstraintValidator::new(&schema, false)
            .validate_insert(&mut tx, entity, 1, &row)
            .unwrap();

        let mut tx = engine.transaction();
        let err = ConstraintValidator::new(&schema, true)
            .validate_insert(&mut tx, entity, 1, &row)
            .unwrap_err();
        assert!(err.is_check_violation());
    }
}
