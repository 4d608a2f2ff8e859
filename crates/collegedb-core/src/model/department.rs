use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Entity, Timestamps};
use crate::catalog::{CheckExpr, ConstraintDef, EntityDef, FieldDef, ScalarType};
use crate::error::Error;
use crate::value::Row;

/// An academic department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub department_id: u64,
    pub department_name: String,
    pub building: Option<String>,
    pub budget: Option<Decimal>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

/// Insert payload for [`Department`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDepartment {
    pub department_name: String,
    pub building: Option<String>,
    pub budget: Option<Decimal>,
}

impl NewDepartment {
    pub fn new(department_name: impl Into<String>) -> Self {
        Self {
            department_name: department_name.into(),
            ..Default::default()
        }
    }

    pub fn building(mut self, building: impl Into<String>) -> Self {
        self.building = Some(building.into());
        self
    }

    pub fn budget(mut self, budget: Decimal) -> Self {
        self.budget = Some(budget);
        self
    }
}

impl From<NewDepartment> for Row {
    fn from(new: NewDepartment) -> Self {
        Row::new()
            .with("department_name", new.department_name)
            .with("building", new.building)
            .with("budget", new.budget)
    }
}

impl Entity for Department {
    const ENTITY: &'static str = "departments";
    type New = NewDepartment;

    fn id(&self) -> u64 {
        self.department_id
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("department_name", self.department_name.clone())
            .with("building", self.building.clone())
            .with("budget", self.budget)
    }

    fn from_row(id: u64, row: &Row, timestamps: Timestamps) -> Result<Self, Error> {
        Ok(Self {
            department_id: id,
            department_name: row.text("department_name")?,
            building: row.opt_text("building")?,
            budget: row.opt_decimal("budget")?,
            timestamps,
        })
    }

    fn definition() -> EntityDef {
        EntityDef::new(Self::ENTITY, "department_id").with_fields([
            FieldDef::new("department_name", ScalarType::String { max_len: 100 }),
            FieldDef::optional("building", ScalarType::String { max_len: 100 }),
            FieldDef::optional(
                "budget",
                ScalarType::Decimal {
                    precision: 12,
                    scale: 2,
                },
            ),
        ])
    }

    fn constraints() -> Vec<ConstraintDef> {
        vec![
            ConstraintDef::unique("departments_name_unique", Self::ENTITY, "department_name"),
            ConstraintDef::check(
                "departments_budget_check",
                Self::ENTITY,
                CheckExpr::Range {
                    field: "budget".into(),
                    min: 0.0,
                    max: None,
                },
            ),
        ]
    }
}
