use super::Repository;
use crate::error::Error;
use crate::model::{Course, Department, DepartmentHead, Instructor};

impl Repository<'_, Instructor> {
    pub fn by_email(&self, email: &str) -> Result<Option<Instructor>, Error> {
        self.first_where("email", email)
    }

    /// Department employing the instructor.
    pub fn department(&self, instructor: &Instructor) -> Result<Department, Error> {
        self.store().departments().find(instructor.department_id)
    }

    /// Courses taught by the instructor.
    pub fn courses(&self, instructor_id: u64) -> Result<Vec<Course>, Error> {
        self.store().courses().where_eq("instructor_id", instructor_id)
    }

    /// Headship held by the instructor, if any.
    pub fn head_of(&self, instructor_id: u64) -> Result<Option<DepartmentHead>, Error> {
        self.store()
            .department_heads()
            .first_where("instructor_id", instructor_id)
    }
}
