//! Entity definitions.

use super::field::FieldDef;
use rkyv::{Archive, Deserialize, Serialize};

/// How an entity's identity is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum IdentityKind {
    /// Surrogate key assigned by the store from a per-table sequence.
    AutoIncrement,
    /// Key supplied by the caller in the identity field itself.
    Assigned,
}

/// An entity definition (table schema).
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity (table) name, unique within schema.
    pub name: String,
    /// Name of the primary identity field.
    pub identity_field: String,
    /// Where identity values come from.
    pub identity: IdentityKind,
    /// Field definitions, excluding an auto-increment identity.
    pub fields: Vec<FieldDef>,
}

impl EntityDef {
    /// Create an entity with a surrogate auto-increment identity.
    pub fn new(name: impl Into<String>, identity_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: identity_field.into(),
            identity: IdentityKind::AutoIncrement,
            fields: Vec::new(),
        }
    }

    /// Create an entity whose identity is taken from one of its own fields.
    pub fn with_assigned_identity(
        name: impl Into<String>,
        identity_field: impl Into<String>,
    ) -> Self {
        Self {
            identity: IdentityKind::Assigned,
            ..Self::new(name, identity_field)
        }
    }

    /// Add a field to the entity.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check if the entity declares a field (the identity counts).
    pub fn has_field(&self, name: &str) -> bool {
        name == self.identity_field || self.get_field(name).is_some()
    }

    /// Check if identities are assigned by the store.
    pub fn is_auto_increment(&self) -> bool {
        self.identity == IdentityKind::AutoIncrement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarType;

    #[test]
    fn test_entity_builder() {
        let entity = EntityDef::new("departments", "department_id")
            .with_field(FieldDef::new(
                "department_name",
                ScalarType::String { max_len: 100 },
            ))
            .with_field(FieldDef::optional(
                "building",
                ScalarType::String { max_len: 100 },
            ));

        assert_eq!(entity.name, "departments");
        assert_eq!(entity.identity_field, "department_id");
        assert!(entity.is_auto_increment());
        assert_eq!(entity.fields.len(), 2);
        assert!(entity.has_field("department_id"));
        assert!(entity.get_field("department_id").is_none());
    }

    #[test]
    fn test_assigned_identity() {
        let entity = EntityDef::with_assigned_identity("department_heads", "department_id")
            .with_field(FieldDef::new("department_id", ScalarType::Int64));

        assert!(!entity.is_auto_increment());
        assert!(entity.get_field("department_id").is_some());
        assert!(entity.get_field("nonexistent").is_none());
    }
}
