//! Core error types.

use thiserror::Error;

/// Core database errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// A write was rejected by a schema constraint.
    #[error("constraint violation: {0}")]
    ConstraintViolation(#[from] ConstraintError),

    /// Cascade processing failed.
    #[error("cascade error: {0}")]
    Cascade(#[from] CascadeError),

    /// Update or delete target does not exist.
    #[error("{entity} row {id} not found")]
    NotFound {
        /// Entity (table) name.
        entity: String,
        /// Identity of the missing row.
        id: u64,
    },

    /// The entity is not part of the registered schema.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// The schema definition is inconsistent.
    #[error("invalid schema: {0}")]
    Schema(String),

    /// Attempt to change an identity field.
    #[error("field {entity}.{field} is immutable")]
    ImmutableField {
        /// Entity (table) name.
        entity: String,
        /// Field name.
        field: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Invalid data format.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),
}

/// Schema constraint violations detected at write time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintError {
    /// A write references a parent row that does not exist.
    #[error("foreign key '{constraint}' violated: {entity}.{field} = {value} has no matching {referenced_entity} row")]
    ForeignKeyViolation {
        /// Relation name.
        constraint: String,
        /// Entity being written.
        entity: String,
        /// Foreign key field.
        field: String,
        /// Referenced entity.
        referenced_entity: String,
        /// Offending identity value.
        value: u64,
    },

    /// A delete is blocked by dependent rows under a restrict relation.
    #[error("cannot delete {entity} row {id}: {count} {referencing_entity} row(s) reference it via '{constraint}'")]
    RestrictedDeleteViolation {
        /// Relation name.
        constraint: String,
        /// Entity being deleted.
        entity: String,
        /// Identity of the row being deleted.
        id: u64,
        /// Entity holding the references.
        referencing_entity: String,
        /// Number of referencing rows.
        count: usize,
    },

    /// A write collides with an existing unique value.
    #[error("unique constraint '{constraint}' violated on {entity}({columns}) for value ({value})", columns = .fields.join(", "))]
    UniqueConstraintViolation {
        /// Constraint name.
        constraint: String,
        /// Entity being written.
        entity: String,
        /// Fields covered by the constraint.
        fields: Vec<String>,
        /// Colliding value(s).
        value: String,
    },

    /// A non-nullable field is missing or null.
    #[error("field {entity}.{field} may not be null")]
    NotNullViolation {
        /// Entity being written.
        entity: String,
        /// Field name.
        field: String,
    },

    /// A check constraint evaluated to false.
    #[error("check constraint '{constraint}' violated on {entity}: {detail}")]
    CheckViolation {
        /// Constraint name.
        constraint: String,
        /// Entity being written.
        entity: String,
        /// Human readable description of the failed check.
        detail: String,
    },
}

/// Errors raised while walking delete cascades.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CascadeError {
    /// The cascade chain exceeded the configured depth.
    #[error("cascade depth {depth} exceeds the maximum")]
    MaxDepthExceeded {
        /// Depth reached.
        depth: usize,
    },
}

impl Error {
    /// Returns the constraint error, if this is a constraint violation.
    pub fn constraint(&self) -> Option<&ConstraintError> {
        match self {
            Error::ConstraintViolation(err) => Some(err),
            _ => None,
        }
    }

    /// Check if this error is a foreign key violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self.constraint(),
            Some(ConstraintError::ForeignKeyViolation { .. })
        )
    }

    /// Check if this error is a restricted delete.
    pub fn is_restricted_delete(&self) -> bool {
        matches!(
            self.constraint(),
            Some(ConstraintError::RestrictedDeleteViolation { .. })
        )
    }

    /// Check if this error is a unique constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self.constraint(),
            Some(ConstraintError::UniqueConstraintViolation { .. })
        )
    }

    /// Check if this error is a not-null violation.
    pub fn is_not_null_violation(&self) -> bool {
        matches!(self.constraint(), Some(ConstraintError::NotNullViolation { .. }))
    }

    /// Check if this error is a check constraint violation.
    pub fn is_check_violation(&self) -> bool {
        matches!(self.constraint(), Some(ConstraintError::CheckViolation { .. }))
    }

    /// Check if this error reports a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub(crate) fn not_found(entity: &str, id: u64) -> Self {
        Error::NotFound {
            entity: entity.to_string(),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_message() {
        let err = Error::from(ConstraintError::UniqueConstraintViolation {
            constraint: "enrollments_student_course_unique".into(),
            entity: "enrollments".into(),
            fields: vec!["student_id".into(), "course_id".into()],
            value: "1, 2".into(),
        });

        assert!(err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
        assert_eq!(
            err.to_string(),
            "constraint violation: unique constraint 'enrollments_student_course_unique' violated on enrollments(student_id, course_id) for value (1, 2)"
        );
    }

    #[test]
    fn test_not_found_predicate() {
        let err = Error::not_found("students", 7);
        assert!(err.is_not_found());
        assert!(err.constraint().is_none());
        assert_eq!(err.to_string(), "students row 7 not found");
    }
}
