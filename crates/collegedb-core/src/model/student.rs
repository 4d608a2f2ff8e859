use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::course::narrow;
use super::{Entity, Timestamps};
use crate::catalog::{
    CheckExpr, ConstraintDef, DeleteBehavior, EntityDef, FieldDef, RelationDef, ScalarType,
};
use crate::error::Error;
use crate::value::Row;

/// A student, optionally majoring in a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub enrollment_year: Option<i32>,
    pub major_department_id: Option<u64>,
    /// Grade point average on the 0.00 to 5.00 scale.
    pub gpa: Option<Decimal>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Insert payload for [`Student`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub enrollment_year: Option<i32>,
    pub major_department_id: Option<u64>,
    pub gpa: Option<Decimal>,
}

impl NewStudent {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn born(mut self, date_of_birth: NaiveDate) -> Self {
        self.date_of_birth = Some(date_of_birth);
        self
    }

    pub fn enrolled_in(mut self, year: i32) -> Self {
        self.enrollment_year = Some(year);
        self
    }

    pub fn major(mut self, department_id: u64) -> Self {
        self.major_department_id = Some(department_id);
        self
    }

    pub fn gpa(mut self, gpa: Decimal) -> Self {
        self.gpa = Some(gpa);
        self
    }
}

impl From<NewStudent> for Row {
    fn from(new: NewStudent) -> Self {
        Row::new()
            .with("first_name", new.first_name)
            .with("last_name", new.last_name)
            .with("email", new.email)
            .with("phone", new.phone)
            .with("date_of_birth", new.date_of_birth)
            .with("enrollment_year", new.enrollment_year)
            .with("major_department_id", new.major_department_id)
            .with("gpa", new.gpa)
    }
}

impl Entity for Student {
    const ENTITY: &'static str = "students";
    type New = NewStudent;

    fn id(&self) -> u64 {
        self.student_id
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("first_name", self.first_name.clone())
            .with("last_name", self.last_name.clone())
            .with("email", self.email.clone())
            .with("phone", self.phone.clone())
            .with("date_of_birth", self.date_of_birth)
            .with("enrollment_year", self.enrollment_year)
            .with("major_department_id", self.major_department_id)
            .with("gpa", self.gpa)
    }

    fn from_row(id: u64, row: &Row, timestamps: Timestamps) -> Result<Self, Error> {
        Ok(Self {
            student_id: id,
            first_name: row.text("first_name")?,
            last_name: row.text("last_name")?,
            email: row.text("email")?,
            phone: row.opt_text("phone")?,
            date_of_birth: row.opt_date("date_of_birth")?,
            enrollment_year: row
                .opt_int("enrollment_year")?
                .map(|year| narrow(year, "enrollment_year"))
                .transpose()?,
            major_department_id: row.opt_id("major_department_id")?,
            gpa: row.opt_decimal("gpa")?,
            timestamps,
        })
    }

    fn definition() -> EntityDef {
        EntityDef::new(Self::ENTITY, "student_id").with_fields([
            FieldDef::new("first_name", ScalarType::String { max_len: 50 }),
            FieldDef::new("last_name", ScalarType::String { max_len: 50 }),
            FieldDef::new("email", ScalarType::String { max_len: 100 }),
            FieldDef::optional("phone", ScalarType::String { max_len: 20 }),
            FieldDef::optional("date_of_birth", ScalarType::Date),
            FieldDef::optional("enrollment_year", ScalarType::Int32),
            FieldDef::optional("major_department_id", ScalarType::Int64),
            FieldDef::optional(
                "gpa",
                ScalarType::Decimal {
                    precision: 3,
                    scale: 2,
                },
            ),
        ])
    }

    fn relations() -> Vec<RelationDef> {
        vec![RelationDef::one_to_many(
            "students_major_fk",
            Self::ENTITY,
            "major_department_id",
            "departments",
        )
        .with_on_delete(DeleteBehavior::SetNull)]
    }

    fn constraints() -> Vec<ConstraintDef> {
        vec![
            ConstraintDef::unique("students_email_unique", Self::ENTITY, "email"),
            ConstraintDef::check(
                "students_gpa_check",
                Self::ENTITY,
                CheckExpr::Range {
                    field: "gpa".into(),
                    min: 0.0,
                    max: Some(5.0),
                },
            ),
        ]
    }
}
