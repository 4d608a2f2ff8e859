use serde::{Deserialize, Serialize};

use super::{Entity, Timestamps};
use crate::catalog::{
    CheckExpr, ConstraintDef, DefaultValue, DeleteBehavior, EntityDef, FieldDef, RelationDef,
    ScalarType,
};
use crate::error::Error;
use crate::value::Row;

/// Credits given to a course when none are supplied.
pub const DEFAULT_CREDITS: i32 = 3;

/// A course offered by a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: u64,
    pub course_code: String,
    pub course_name: String,
    pub department_id: u64,
    pub instructor_id: Option<u64>,
    pub credits: i32,
    pub semester: Option<String>,
    pub year: Option<i32>,
    pub room_number: Option<String>,
    pub schedule: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

/// Insert payload for [`Course`].
///
/// `credits` left as `None` is filled with [`DEFAULT_CREDITS`] by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCourse {
    pub course_code: String,
    pub course_name: String,
    pub department_id: u64,
    pub instructor_id: Option<u64>,
    pub credits: Option<i32>,
    pub semester: Option<String>,
    pub year: Option<i32>,
    pub room_number: Option<String>,
    pub schedule: Option<String>,
}

impl NewCourse {
    pub fn new(
        course_code: impl Into<String>,
        course_name: impl Into<String>,
        department_id: u64,
    ) -> Self {
        Self {
            course_code: course_code.into(),
            course_name: course_name.into(),
            department_id,
            ..Default::default()
        }
    }

    pub fn instructor(mut self, instructor_id: u64) -> Self {
        self.instructor_id = Some(instructor_id);
        self
    }

    pub fn credits(mut self, credits: i32) -> Self {
        self.credits = Some(credits);
        self
    }

    pub fn term(mut self, semester: impl Into<String>, year: i32) -> Self {
        self.semester = Some(semester.into());
        self.year = Some(year);
        self
    }

    pub fn room(mut self, room_number: impl Into<String>) -> Self {
        self.room_number = Some(room_number.into());
        self
    }

    pub fn schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }
}

impl From<NewCourse> for Row {
    fn from(new: NewCourse) -> Self {
        let mut row = Row::new()
            .with("course_code", new.course_code)
            .with("course_name", new.course_name)
            .with("department_id", new.department_id)
            .with("instructor_id", new.instructor_id)
            .with("semester", new.semester)
            .with("year", new.year)
            .with("room_number", new.room_number)
            .with("schedule", new.schedule);
        if let Some(credits) = new.credits {
            row.set("credits", credits);
        }
        row
    }
}

impl Entity for Course {
    const ENTITY: &'static str = "courses";
    type New = NewCourse;

    fn id(&self) -> u64 {
        self.course_id
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("course_code", self.course_code.clone())
            .with("course_name", self.course_name.clone())
            .with("department_id", self.department_id)
            .with("instructor_id", self.instructor_id)
            .with("credits", self.credits)
            .with("semester", self.semester.clone())
            .with("year", self.year)
            .with("room_number", self.room_number.clone())
            .with("schedule", self.schedule.clone())
    }

    fn from_row(id: u64, row: &Row, timestamps: Timestamps) -> Result<Self, Error> {
        Ok(Self {
            course_id: id,
            course_code: row.text("course_code")?,
            course_name: row.text("course_name")?,
            department_id: row.id("department_id")?,
            instructor_id: row.opt_id("instructor_id")?,
            credits: narrow(row.int("credits")?, "credits")?,
            semester: row.opt_text("semester")?,
            year: row
                .opt_int("year")?
                .map(|year| narrow(year, "year"))
                .transpose()?,
            room_number: row.opt_text("room_number")?,
            schedule: row.opt_text("schedule")?,
            timestamps,
        })
    }

    fn definition() -> EntityDef {
        EntityDef::new(Self::ENTITY, "course_id").with_fields([
            FieldDef::new("course_code", ScalarType::String { max_len: 20 }),
            FieldDef::new("course_name", ScalarType::String { max_len: 100 }),
            FieldDef::new("department_id", ScalarType::Int64),
            FieldDef::optional("instructor_id", ScalarType::Int64),
            FieldDef::new("credits", ScalarType::Int32)
                .with_default(DefaultValue::Int(DEFAULT_CREDITS as i64)),
            FieldDef::optional("semester", ScalarType::String { max_len: 20 }),
            FieldDef::optional("year", ScalarType::Int32),
            FieldDef::optional("room_number", ScalarType::String { max_len: 20 }),
            FieldDef::optional("schedule", ScalarType::String { max_len: 100 }),
        ])
    }

    fn relations() -> Vec<RelationDef> {
        vec![
            RelationDef::one_to_many(
                "courses_department_fk",
                Self::ENTITY,
                "department_id",
                "departments",
            )
            .with_on_delete(DeleteBehavior::Restrict),
            RelationDef::one_to_many(
                "courses_instructor_fk",
                Self::ENTITY,
                "instructor_id",
                "instructors",
            )
            .with_on_delete(DeleteBehavior::SetNull),
        ]
    }

    fn constraints() -> Vec<ConstraintDef> {
        vec![
            ConstraintDef::unique("courses_code_unique", Self::ENTITY, "course_code"),
            ConstraintDef::check(
                "courses_credits_check",
                Self::ENTITY,
                CheckExpr::Range {
                    field: "credits".into(),
                    min: 1.0,
                    max: Some(6.0),
                },
            ),
        ]
    }
}

pub(super) fn narrow(value: i64, field: &str) -> Result<i32, Error> {
    i32::try_from(value)
        .map_err(|_| Error::InvalidData(format!("field {field}: {value} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omitted_credits_left_to_default() {
        let row: Row = NewCourse::new("CS101", "Introduction to Programming", 1).into();
        assert!(!row.contains("credits"));

        let row: Row = NewCourse::new("CS201", "Data Structures", 1).credits(4).into();
        assert_eq!(row.int("credits").unwrap(), 4);
    }

    #[test]
    fn test_from_row() {
        let row = Row::new()
            .with("course_code", "MATH101")
            .with("course_name", "Calculus I")
            .with("department_id", 2)
            .with("instructor_id", Option::<u64>::None)
            .with("credits", 4)
            .with("year", 2024);

        let course = Course::from_row(3, &row, Timestamps::default()).unwrap();
        assert_eq!(course.course_id, 3);
        assert_eq!(course.instructor_id, None);
        assert_eq!(course.credits, 4);
        assert_eq!(course.year, Some(2024));
        assert_eq!(course.semester, None);
    }
}
