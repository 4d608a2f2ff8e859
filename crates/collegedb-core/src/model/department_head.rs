use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Entity, Timestamps};
use crate::catalog::{ConstraintDef, DeleteBehavior, EntityDef, FieldDef, RelationDef, ScalarType};
use crate::error::Error;
use crate::value::Row;

/// The current head of a department.
///
/// Keyed by the department: a department has at most one head, and an
/// instructor heads at most one department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentHead {
    pub department_id: u64,
    pub instructor_id: u64,
    pub start_date: NaiveDate,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

/// Insert payload for [`DepartmentHead`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDepartmentHead {
    pub department_id: u64,
    pub instructor_id: u64,
    pub start_date: NaiveDate,
}

impl NewDepartmentHead {
    pub fn new(department_id: u64, instructor_id: u64, start_date: NaiveDate) -> Self {
        Self {
            department_id,
            instructor_id,
            start_date,
        }
    }
}

impl From<NewDepartmentHead> for Row {
    fn from(new: NewDepartmentHead) -> Self {
        Row::new()
            .with("department_id", new.department_id)
            .with("instructor_id", new.instructor_id)
            .with("start_date", new.start_date)
    }
}

impl Entity for DepartmentHead {
    const ENTITY: &'static str = "department_heads";
    type New = NewDepartmentHead;

    fn id(&self) -> u64 {
        self.department_id
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("department_id", self.department_id)
            .with("instructor_id", self.instructor_id)
            .with("start_date", self.start_date)
    }

    fn from_row(id: u64, row: &Row, timestamps: Timestamps) -> Result<Self, Error> {
        Ok(Self {
            department_id: id,
            instructor_id: row.id("instructor_id")?,
            start_date: row.date("start_date")?,
            timestamps,
        })
    }

    fn definition() -> EntityDef {
        EntityDef::with_assigned_identity(Self::ENTITY, "department_id").with_fields([
            FieldDef::new("department_id", ScalarType::Int64),
            FieldDef::new("instructor_id", ScalarType::Int64),
            FieldDef::new("start_date", ScalarType::Date),
        ])
    }

    fn relations() -> Vec<RelationDef> {
        vec![
            RelationDef::one_to_one(
                "department_heads_department_fk",
                Self::ENTITY,
                "department_id",
                "departments",
            )
            .with_on_delete(DeleteBehavior::Cascade),
            RelationDef::one_to_one(
                "department_heads_instructor_fk",
                Self::ENTITY,
                "instructor_id",
                "instructors",
            )
            .with_on_delete(DeleteBehavior::Cascade),
        ]
    }

    fn constraints() -> Vec<ConstraintDef> {
        vec![ConstraintDef::unique(
            "department_heads_instructor_unique",
            Self::ENTITY,
            "instructor_id",
        )]
    }
}
