//! Relation (foreign key) definitions between entities.

use rkyv::{Archive, Deserialize, Serialize};

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum Cardinality {
    /// One-to-one relation (unique foreign key).
    OneToOne,
    /// One-to-many relation (foreign key on many side).
    OneToMany,
}

/// Behavior when a referenced entity is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum DeleteBehavior {
    /// Delete related entities.
    Cascade,
    /// Prevent deletion if related entities exist.
    Restrict,
    /// Set foreign key to null.
    SetNull,
}

impl DeleteBehavior {
    /// SQL keyword for this behavior.
    pub fn sql_name(&self) -> &'static str {
        match self {
            DeleteBehavior::Cascade => "CASCADE",
            DeleteBehavior::Restrict => "RESTRICT",
            DeleteBehavior::SetNull => "SET NULL",
        }
    }
}

/// A foreign key from `from_entity.from_field` to the identity of `to_entity`.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relation name (unique within schema).
    pub name: String,
    /// Entity holding the foreign key.
    pub from_entity: String,
    /// Foreign key field on the source entity.
    pub from_field: String,
    /// Referenced entity.
    pub to_entity: String,
    /// Relation cardinality.
    pub cardinality: Cardinality,
    /// Delete behavior.
    pub on_delete: DeleteBehavior,
}

impl RelationDef {
    /// Create a one-to-one relation.
    pub fn one_to_one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            from_field: from_field.into(),
            to_entity: to_entity.into(),
            cardinality: Cardinality::OneToOne,
            on_delete: DeleteBehavior::Restrict,
        }
    }

    /// Create a one-to-many relation.
    pub fn one_to_many(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            from_field: from_field.into(),
            to_entity: to_entity.into(),
            cardinality: Cardinality::OneToMany,
            on_delete: DeleteBehavior::Restrict,
        }
    }

    /// Set delete behavior.
    pub fn with_on_delete(mut self, on_delete: DeleteBehavior) -> Self {
        self.on_delete = on_delete;
        self
    }
}
