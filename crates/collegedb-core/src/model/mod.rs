//! Plain records for the college schema.
//!
//! Each table has a record type carrying its committed state and an insert
//! payload. Records hold no store handle; reads and writes go through
//! [`crate::repository`].

mod course;
mod department;
mod department_head;
mod enrollment;
mod instructor;
mod student;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{ConstraintDef, EntityDef, RelationDef, SchemaBundle};
use crate::error::Error;
use crate::store::StoredRow;
use crate::value::Row;

pub use course::{Course, NewCourse, DEFAULT_CREDITS};
pub use department::{Department, NewDepartment};
pub use department_head::{DepartmentHead, NewDepartmentHead};
pub use enrollment::{Enrollment, EnrollmentStatus, NewEnrollment, GRADES};
pub use instructor::{Instructor, NewInstructor};
pub use student::{NewStudent, Student};

/// Creation and last-modification times of a committed row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Convert microsecond timestamps as kept by the storage layer.
    pub fn from_micros(created_at: u64, updated_at: u64) -> Self {
        let convert =
            |micros: u64| DateTime::from_timestamp_micros(micros as i64).unwrap_or_default();
        Self {
            created_at: convert(created_at),
            updated_at: convert(updated_at),
        }
    }
}

/// A table of the college schema and its record type.
pub trait Entity: Sized {
    /// Table name.
    const ENTITY: &'static str;

    /// Insert payload for this table.
    type New: Into<Row>;

    /// Identity of the record.
    fn id(&self) -> u64;

    /// Every non-key column of the record.
    fn to_row(&self) -> Row;

    /// Build a record from a committed row.
    fn from_row(id: u64, row: &Row, timestamps: Timestamps) -> Result<Self, Error>;

    /// Table definition.
    fn definition() -> EntityDef;

    /// Foreign keys declared by this table.
    fn relations() -> Vec<RelationDef> {
        Vec::new()
    }

    /// Unique and check constraints declared by this table.
    fn constraints() -> Vec<ConstraintDef> {
        Vec::new()
    }

    /// Build a record from a row returned by the store.
    fn from_stored(stored: &StoredRow) -> Result<Self, Error> {
        Self::from_row(
            stored.id,
            &stored.row,
            Timestamps::from_micros(stored.created_at, stored.updated_at),
        )
    }
}

fn register<T: Entity>(schema: SchemaBundle) -> SchemaBundle {
    let schema = schema.with_entity(T::definition());
    let schema = T::relations()
        .into_iter()
        .fold(schema, SchemaBundle::with_relation);
    T::constraints()
        .into_iter()
        .fold(schema, SchemaBundle::with_constraint)
}

/// The six-table college administration schema.
pub fn college_schema() -> SchemaBundle {
    let schema = SchemaBundle::new(1);
    let schema = register::<Department>(schema);
    let schema = register::<Instructor>(schema);
    let schema = register::<DepartmentHead>(schema);
    let schema = register::<Course>(schema);
    let schema = register::<Student>(schema);
    register::<Enrollment>(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DeleteBehavior;

    #[test]
    fn test_college_schema_is_valid() {
        let schema = college_schema();
        schema.validate().unwrap();
        assert_eq!(
            schema.entity_names(),
            vec![
                "courses",
                "department_heads",
                "departments",
                "enrollments",
                "instructors",
                "students"
            ]
        );
        assert_eq!(schema.relations.len(), 8);
    }

    #[test]
    fn test_delete_rules() {
        let schema = college_schema();
        let rule = |entity: &str, field: &str| {
            schema
                .relations
                .values()
                .find(|r| r.from_entity == entity && r.from_field == field)
                .map(|r| r.on_delete)
        };

        assert_eq!(rule("instructors", "department_id"), Some(DeleteBehavior::Restrict));
        assert_eq!(rule("courses", "department_id"), Some(DeleteBehavior::Restrict));
        assert_eq!(rule("courses", "instructor_id"), Some(DeleteBehavior::SetNull));
        assert_eq!(rule("students", "major_department_id"), Some(DeleteBehavior::SetNull));
        assert_eq!(rule("department_heads", "department_id"), Some(DeleteBehavior::Cascade));
        assert_eq!(rule("department_heads", "instructor_id"), Some(DeleteBehavior::Cascade));
        assert_eq!(rule("enrollments", "student_id"), Some(DeleteBehavior::Cascade));
        assert_eq!(rule("enrollments", "course_id"), Some(DeleteBehavior::Cascade));
    }

    #[test]
    fn test_unique_constraints() {
        let schema = college_schema();
        let unique: Vec<(&str, Vec<&str>)> = schema
            .constraints
            .iter()
            .filter(|c| c.is_unique())
            .map(|c| (c.entity(), c.fields()))
            .collect();

        assert!(unique.contains(&("departments", vec!["department_name"])));
        assert!(unique.contains(&("instructors", vec!["email"])));
        assert!(unique.contains(&("department_heads", vec!["instructor_id"])));
        assert!(unique.contains(&("courses", vec!["course_code"])));
        assert!(unique.contains(&("students", vec!["email"])));
        assert!(unique.contains(&("enrollments", vec!["student_id", "course_id"])));
    }

    #[test]
    fn test_timestamps_from_micros() {
        let ts = Timestamps::from_micros(1_700_000_000_000_000, 1_700_000_000_500_000);
        assert_eq!(ts.created_at.timestamp(), 1_700_000_000);
        assert_eq!(
            (ts.updated_at - ts.created_at).num_milliseconds(),
            500
        );
    }
}
