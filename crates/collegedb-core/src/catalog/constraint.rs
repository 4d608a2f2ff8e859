//! Constraint definitions for entities.
//!
//! Foreign keys are expressed as [`super::RelationDef`]s; this module covers
//! uniqueness and value checks.

use rkyv::{Archive, Deserialize, Serialize};

/// A constraint definition.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum ConstraintDef {
    /// Uniqueness constraint (single or composite).
    Unique {
        /// Constraint name.
        name: String,
        /// Entity this constraint applies to.
        entity: String,
        /// Fields that must be unique together.
        fields: Vec<String>,
    },
    /// Value check on a single field.
    Check {
        /// Constraint name.
        name: String,
        /// Entity this constraint applies to.
        entity: String,
        /// Predicate that must hold for non-null values.
        check: CheckExpr,
    },
}

/// Predicates supported by check constraints.
///
/// NULL always satisfies a check; nullability is a separate rule.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum CheckExpr {
    /// Numeric value within `[min, max]` (no upper bound when `max` is `None`).
    Range {
        /// Checked field.
        field: String,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: Option<f64>,
    },
    /// Text value drawn from a fixed vocabulary.
    OneOf {
        /// Checked field.
        field: String,
        /// Allowed values.
        values: Vec<String>,
    },
}

impl CheckExpr {
    /// The field the predicate reads.
    pub fn field(&self) -> &str {
        match self {
            CheckExpr::Range { field, .. } => field,
            CheckExpr::OneOf { field, .. } => field,
        }
    }

    /// Short description for listings and error messages.
    pub fn describe(&self) -> String {
        match self {
            CheckExpr::Range {
                field,
                min,
                max: Some(max),
            } => format!("{field} BETWEEN {min} AND {max}"),
            CheckExpr::Range {
                field,
                min,
                max: None,
            } => format!("{field} >= {min}"),
            CheckExpr::OneOf { field, values } => {
                format!("{field} IN ({})", values.join(", "))
            }
        }
    }
}

impl ConstraintDef {
    /// Create a unique constraint on a single field.
    pub fn unique(
        name: impl Into<String>,
        entity: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        ConstraintDef::Unique {
            name: name.into(),
            entity: entity.into(),
            fields: vec![field.into()],
        }
    }

    /// Create a composite unique constraint.
    pub fn unique_composite(
        name: impl Into<String>,
        entity: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        ConstraintDef::Unique {
            name: name.into(),
            entity: entity.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a check constraint.
    pub fn check(name: impl Into<String>, entity: impl Into<String>, check: CheckExpr) -> Self {
        ConstraintDef::Check {
            name: name.into(),
            entity: entity.into(),
            check,
        }
    }

    /// Get the constraint name.
    pub fn name(&self) -> &str {
        match self {
            ConstraintDef::Unique { name, .. } => name,
            ConstraintDef::Check { name, .. } => name,
        }
    }

    /// Get the entity this constraint applies to.
    pub fn entity(&self) -> &str {
        match self {
            ConstraintDef::Unique { entity, .. } => entity,
            ConstraintDef::Check { entity, .. } => entity,
        }
    }

    /// Fields read by the constraint.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ConstraintDef::Unique { fields, .. } => fields.iter().map(String::as_str).collect(),
            ConstraintDef::Check { check, .. } => vec![check.field()],
        }
    }

    /// Check if this is a unique constraint.
    pub fn is_unique(&self) -> bool {
        matches!(self, ConstraintDef::Unique { .. })
    }

    /// Check if this is a check constraint.
    pub fn is_check(&self) -> bool {
        matches!(self, ConstraintDef::Check { .. })
    }
}
