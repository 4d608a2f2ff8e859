//! Semantic catalog for the college store.
//!
//! The catalog stores metadata about entities, relations, constraints, and schema versions.

mod catalog;
mod constraint;
mod entity;
mod field;
mod relation;
mod schema;
mod types;

pub use catalog::Catalog;
pub use constraint::{CheckExpr, ConstraintDef};
pub use entity::{EntityDef, IdentityKind};
pub use field::{DefaultValue, FieldDef};
pub use relation::{Cardinality, DeleteBehavior, RelationDef};
pub use schema::SchemaBundle;
pub use types::ScalarType;
