//! CollegeDB Core - constraint-enforcing store for college administration data.
//!
//! This crate provides the schema catalog, sled-backed storage, constraint
//! and cascade enforcement, plain records with per-table repositories, and
//! the fixture loader.

pub mod cascade;
pub mod catalog;
pub mod constraint;
pub mod error;
pub mod model;
pub mod repository;
pub mod seed;
pub mod storage;
pub mod store;
pub mod value;

pub use cascade::{CascadeExecutor, CascadeResult};
pub use catalog::{
    Cardinality, Catalog, CheckExpr, ConstraintDef, DefaultValue, DeleteBehavior, EntityDef,
    FieldDef, IdentityKind, RelationDef, ScalarType, SchemaBundle,
};
pub use constraint::{CheckEvaluator, ConstraintValidator, UniqueIndex};
pub use error::{CascadeError, ConstraintError, Error};
pub use model::{
    college_schema, Course, Department, DepartmentHead, Enrollment, EnrollmentStatus, Entity,
    Instructor, NewCourse, NewDepartment, NewDepartmentHead, NewEnrollment, NewInstructor,
    NewStudent, Student, Timestamps,
};
pub use repository::Repository;
pub use seed::{load_fixtures, SeedSummary};
pub use storage::{Record, StorageConfig, StorageEngine, Transaction};
pub use store::{Store, StoreConfig, StoredRow};
pub use value::{Row, Value};
