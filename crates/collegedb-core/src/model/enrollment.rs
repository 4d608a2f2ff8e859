use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Entity, Timestamps};
use crate::catalog::{
    CheckExpr, ConstraintDef, DefaultValue, DeleteBehavior, EntityDef, FieldDef, RelationDef,
    ScalarType,
};
use crate::error::Error;
use crate::value::Row;

/// Grades in use: numeric "1" to "5", "A" for passed and "MA" for failed.
pub const GRADES: [&str; 7] = ["1", "2", "3", "4", "5", "A", "MA"];

/// Lifecycle of an enrollment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    Dropped,
    Failed,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 4] = [
        EnrollmentStatus::Active,
        EnrollmentStatus::Completed,
        EnrollmentStatus::Dropped,
        EnrollmentStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "Active",
            EnrollmentStatus::Completed => "Completed",
            EnrollmentStatus::Dropped => "Dropped",
            EnrollmentStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidData(format!("unknown enrollment status: {s}")))
    }
}

/// A student's registration in a course.
///
/// `status` is kept as stored text so rows written outside the usual
/// vocabulary still load; use [`Enrollment::status_kind`] for the typed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub enrollment_id: u64,
    pub student_id: u64,
    pub course_id: u64,
    pub enrollment_date: NaiveDate,
    pub grade: Option<String>,
    pub status: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Enrollment {
    pub fn status_kind(&self) -> Result<EnrollmentStatus, Error> {
        self.status.parse()
    }
}

/// Insert payload for [`Enrollment`].
///
/// `status` left as `None` is filled with "Active" by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub student_id: u64,
    pub course_id: u64,
    pub enrollment_date: NaiveDate,
    pub grade: Option<String>,
    pub status: Option<String>,
}

impl NewEnrollment {
    pub fn new(student_id: u64, course_id: u64, enrollment_date: NaiveDate) -> Self {
        Self {
            student_id,
            course_id,
            enrollment_date,
            grade: None,
            status: None,
        }
    }

    pub fn grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = Some(grade.into());
        self
    }

    pub fn status(mut self, status: EnrollmentStatus) -> Self {
        self.status = Some(status.as_str().to_string());
        self
    }
}

impl From<NewEnrollment> for Row {
    fn from(new: NewEnrollment) -> Self {
        let mut row = Row::new()
            .with("student_id", new.student_id)
            .with("course_id", new.course_id)
            .with("enrollment_date", new.enrollment_date)
            .with("grade", new.grade);
        if let Some(status) = new.status {
            row.set("status", status);
        }
        row
    }
}

impl Entity for Enrollment {
    const ENTITY: &'static str = "enrollments";
    type New = NewEnrollment;

    fn id(&self) -> u64 {
        self.enrollment_id
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("student_id", self.student_id)
            .with("course_id", self.course_id)
            .with("enrollment_date", self.enrollment_date)
            .with("grade", self.grade.clone())
            .with("status", self.status.clone())
    }

    fn from_row(id: u64, row: &Row, timestamps: Timestamps) -> Result<Self, Error> {
        Ok(Self {
            enrollment_id: id,
            student_id: row.id("student_id")?,
            course_id: row.id("course_id")?,
            enrollment_date: row.date("enrollment_date")?,
            grade: row.opt_text("grade")?,
            status: row.text("status")?,
            timestamps,
        })
    }

    fn definition() -> EntityDef {
        EntityDef::new(Self::ENTITY, "enrollment_id").with_fields([
            FieldDef::new("student_id", ScalarType::Int64),
            FieldDef::new("course_id", ScalarType::Int64),
            FieldDef::new("enrollment_date", ScalarType::Date),
            FieldDef::optional("grade", ScalarType::String { max_len: 2 }),
            FieldDef::new("status", ScalarType::String { max_len: 20 }).with_default(
                DefaultValue::Text(EnrollmentStatus::Active.as_str().to_string()),
            ),
        ])
    }

    fn relations() -> Vec<RelationDef> {
        vec![
            RelationDef::one_to_many(
                "enrollments_student_fk",
                Self::ENTITY,
                "student_id",
                "students",
            )
            .with_on_delete(DeleteBehavior::Cascade),
            RelationDef::one_to_many(
                "enrollments_course_fk",
                Self::ENTITY,
                "course_id",
                "courses",
            )
            .with_on_delete(DeleteBehavior::Cascade),
        ]
    }

    fn constraints() -> Vec<ConstraintDef> {
        vec![
            ConstraintDef::unique_composite(
                "enrollments_student_course_unique",
                Self::ENTITY,
                ["student_id", "course_id"],
            ),
            ConstraintDef::check(
                "enrollments_grade_check",
                Self::ENTITY,
                CheckExpr::OneOf {
                    field: "grade".into(),
                    values: GRADES.iter().map(|g| g.to_string()).collect(),
                },
            ),
            ConstraintDef::check(
                "enrollments_status_check",
                Self::ENTITY,
                CheckExpr::OneOf {
                    field: "status".into(),
                    values: EnrollmentStatus::ALL
                        .iter()
                        .map(|s| s.as_str().to_string())
                        .collect(),
                },
            ),
        ]
    }
}
