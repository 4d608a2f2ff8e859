use chrono::NaiveDate;
use tracing::debug;

use super::Repository;
use crate::error::Error;
use crate::model::{Department, DepartmentHead, Entity, Instructor, NewDepartmentHead};

impl Repository<'_, DepartmentHead> {
    /// Make `instructor_id` the head of `department_id`.
    ///
    /// Replaces the current head of the department if there is one; no
    /// history of earlier heads is kept.
    pub fn assign(
        &self,
        department_id: u64,
        instructor_id: u64,
        start_date: NaiveDate,
    ) -> Result<DepartmentHead, Error> {
        match self.get(department_id)? {
            Some(mut current) => {
                debug!(
                    department_id,
                    previous = current.instructor_id,
                    instructor_id,
                    "replacing department head"
                );
                current.instructor_id = instructor_id;
                current.start_date = start_date;
                self.update(&current)
            }
            None => self.insert(NewDepartmentHead::new(department_id, instructor_id, start_date)),
        }
    }

    pub fn department(&self, head: &DepartmentHead) -> Result<Department, Error> {
        self.store().departments().find(head.id())
    }

    pub fn instructor(&self, head: &DepartmentHead) -> Result<Instructor, Error> {
        self.store().instructors().find(head.instructor_id)
    }
}
