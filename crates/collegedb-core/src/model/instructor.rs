use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Entity, Timestamps};
use crate::catalog::{
    CheckExpr, ConstraintDef, DeleteBehavior, EntityDef, FieldDef, RelationDef, ScalarType,
};
use crate::error::Error;
use crate::value::Row;

/// A member of teaching staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instructor {
    pub instructor_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department_id: u64,
    pub salary: Option<Decimal>,
    pub hire_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Instructor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Insert payload for [`Instructor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInstructor {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department_id: u64,
    pub salary: Option<Decimal>,
    pub hire_date: Option<NaiveDate>,
}

impl NewInstructor {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        department_id: u64,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            department_id,
            salary: None,
            hire_date: None,
        }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn salary(mut self, salary: Decimal) -> Self {
        self.salary = Some(salary);
        self
    }

    pub fn hire_date(mut self, hire_date: NaiveDate) -> Self {
        self.hire_date = Some(hire_date);
        self
    }
}

impl From<NewInstructor> for Row {
    fn from(new: NewInstructor) -> Self {
        Row::new()
            .with("first_name", new.first_name)
            .with("last_name", new.last_name)
            .with("email", new.email)
            .with("phone", new.phone)
            .with("department_id", new.department_id)
            .with("salary", new.salary)
            .with("hire_date", new.hire_date)
    }
}

impl Entity for Instructor {
    const ENTITY: &'static str = "instructors";
    type New = NewInstructor;

    fn id(&self) -> u64 {
        self.instructor_id
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("first_name", self.first_name.clone())
            .with("last_name", self.last_name.clone())
            .with("email", self.email.clone())
            .with("phone", self.phone.clone())
            .with("department_id", self.department_id)
            .with("salary", self.salary)
            .with("hire_date", self.hire_date)
    }

    fn from_row(id: u64, row: &Row, timestamps: Timestamps) -> Result<Self, Error> {
        Ok(Self {
            instructor_id: id,
            first_name: row.text("first_name")?,
            last_name: row.text("last_name")?,
            email: row.text("email")?,
            phone: row.opt_text("phone")?,
            department_id: row.id("department_id")?,
            salary: row.opt_decimal("salary")?,
            hire_date: row.opt_date("hire_date")?,
            timestamps,
        })
    }

    fn definition() -> EntityDef {
        EntityDef::new(Self::ENTITY, "instructor_id").with_fields([
            FieldDef::new("first_name", ScalarType::String { max_len: 50 }),
            FieldDef::new("last_name", ScalarType::String { max_len: 50 }),
            FieldDef::new("email", ScalarType::String { max_len: 100 }),
            FieldDef::optional("phone", ScalarType::String { max_len: 20 }),
            FieldDef::new("department_id", ScalarType::Int64),
            FieldDef::optional(
                "salary",
                ScalarType::Decimal {
                    precision: 10,
                    scale: 2,
                },
            ),
            FieldDef::optional("hire_date", ScalarType::Date),
        ])
    }

    fn relations() -> Vec<RelationDef> {
        vec![RelationDef::one_to_many(
            "instructors_department_fk",
            Self::ENTITY,
            "department_id",
            "departments",
        )
        .with_on_delete(DeleteBehavior::Restrict)]
    }

    fn constraints() -> Vec<ConstraintDef> {
        vec![
            ConstraintDef::unique("instructors_email_unique", Self::ENTITY, "email"),
            ConstraintDef::check(
                "instructors_salary_check",
                Self::ENTITY,
                CheckExpr::Range {
                    field: "salary".into(),
                    min: 0.0,
                    max: None,
                },
            ),
        ]
    }
}
