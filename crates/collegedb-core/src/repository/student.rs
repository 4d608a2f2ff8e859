use super::Repository;
use crate::error::Error;
use crate::model::{Course, Department, Enrollment, Student};

impl Repository<'_, Student> {
    pub fn by_email(&self, email: &str) -> Result<Option<Student>, Error> {
        self.first_where("email", email)
    }

    /// Major department; `None` when undeclared.
    pub fn major(&self, student: &Student) -> Result<Option<Department>, Error> {
        match student.major_department_id {
            Some(id) => self.store().departments().get(id),
            None => Ok(None),
        }
    }

    pub fn enrollments(&self, student_id: u64) -> Result<Vec<Enrollment>, Error> {
        self.store().enrollments().where_eq("student_id", student_id)
    }

    /// Courses the student is registered in, each with its enrollment row.
    pub fn courses(&self, student_id: u64) -> Result<Vec<(Course, Enrollment)>, Error> {
        let courses = self.store().courses();
        self.enrollments(student_id)?
            .into_iter()
            .map(|enrollment| Ok((courses.find(enrollment.course_id)?, enrollment)))
            .collect()
    }
}
