//! Schema bundle - versioned snapshot of the entire schema.

use super::{ConstraintDef, DeleteBehavior, EntityDef, RelationDef};
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};
use std::collections::BTreeMap;

/// A versioned snapshot of the entire schema.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct SchemaBundle {
    /// Schema version (monotonically increasing).
    pub version: u64,
    /// Creation timestamp (microseconds since Unix epoch).
    pub created_at: u64,
    /// Entity definitions keyed by name.
    pub entities: BTreeMap<String, EntityDef>,
    /// Relation definitions keyed by name.
    pub relations: BTreeMap<String, RelationDef>,
    /// Constraint definitions.
    pub constraints: Vec<ConstraintDef>,
}

impl SchemaBundle {
    /// Create an empty schema bundle.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            created_at: crate::storage::key::current_timestamp(),
            entities: BTreeMap::new(),
            relations: BTreeMap::new(),
            constraints: Vec::new(),
        }
    }

    /// Add an entity to the schema.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Add a relation to the schema.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    /// Add a constraint to the schema.
    pub fn with_constraint(mut self, constraint: ConstraintDef) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Get an entity by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Get an entity by name, failing for names outside the schema.
    pub fn entity(&self, name: &str) -> Result<&EntityDef, Error> {
        self.get_entity(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// Get a relation by name.
    pub fn get_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }

    /// Get all relations for an entity (as source).
    pub fn relations_from(&self, entity: &str) -> Vec<&RelationDef> {
        self.relations
            .values()
            .filter(|r| r.from_entity == entity)
            .collect()
    }

    /// Get all relations to an entity (as target).
    pub fn relations_to(&self, entity: &str) -> Vec<&RelationDef> {
        self.relations
            .values()
            .filter(|r| r.to_entity == entity)
            .collect()
    }

    /// Get all constraints for an entity.
    pub fn constraints_for(&self, entity: &str) -> Vec<&ConstraintDef> {
        self.constraints
            .iter()
            .filter(|c| c.entity() == entity)
            .collect()
    }

    /// List all entity names.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(|s| s.as_str()).collect()
    }

    /// Check that every relation and constraint refers to declared entities and fields.
    pub fn validate(&self) -> Result<(), Error> {
        for entity in self.entities.values() {
            let declared = entity.get_field(&entity.identity_field).is_some();
            if entity.is_auto_increment() == declared {
                return Err(Error::Schema(format!(
                    "{}: identity field {} must {}be declared as a field",
                    entity.name,
                    entity.identity_field,
                    if declared { "not " } else { "" }
                )));
            }
        }

        for relation in self.relations.values() {
            let from = self.entity(&relation.from_entity).map_err(|_| {
                Error::Schema(format!(
                    "relation {} starts at unknown entity {}",
                    relation.name, relation.from_entity
                ))
            })?;
            if self.get_entity(&relation.to_entity).is_none() {
                return Err(Error::Schema(format!(
                    "relation {} targets unknown entity {}",
                    relation.name, relation.to_entity
                )));
            }
            let field = from.get_field(&relation.from_field).ok_or_else(|| {
                Error::Schema(format!(
                    "relation {}: {}.{} is not declared",
                    relation.name, relation.from_entity, relation.from_field
                ))
            })?;
            if relation.on_delete == DeleteBehavior::SetNull && !field.nullable {
                return Err(Error::Schema(format!(
                    "relation {}: SET NULL on non-nullable field {}.{}",
                    relation.name, relation.from_entity, relation.from_field
                )));
            }
        }

        for constraint in &self.constraints {
            let entity = self.entity(constraint.entity()).map_err(|_| {
                Error::Schema(format!(
                    "constraint {} applies to unknown entity {}",
                    constraint.name(),
                    constraint.entity()
                ))
            })?;
            for field in constraint.fields() {
                if !entity.has_field(field) {
                    return Err(Error::Schema(format!(
                        "constraint {} reads undeclared field {}.{}",
                        constraint.name(),
                        entity.name,
                        field
                    )));
                }
            }
        }

        Ok(())
    }

    /// Compare definitions, ignoring version and creation time.
    pub fn same_definition(&self, other: &SchemaBundle) -> bool {
        self.entities == other.entities
            && self.relations == other.relations
            && self.constraints == other.constraints
    }

    /// Serialize the schema bundle to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a schema bundle from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        // sled values carry no alignment guarantee
        let mut aligned = rkyv::util::AlignedVec::<16>::new();
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

impl Default for SchemaBundle {
    fn default() -> Self {
        Self::new(0)
    }
}
