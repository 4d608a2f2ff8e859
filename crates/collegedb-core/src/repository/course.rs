use super::Repository;
use crate::error::Error;
use crate::model::{Course, Department, Enrollment, Instructor, Student};

impl Repository<'_, Course> {
    pub fn by_code(&self, course_code: &str) -> Result<Option<Course>, Error> {
        self.first_where("course_code", course_code)
    }

    pub fn department(&self, course: &Course) -> Result<Department, Error> {
        self.store().departments().find(course.department_id)
    }

    /// Instructor teaching the course; `None` when unassigned.
    pub fn instructor(&self, course: &Course) -> Result<Option<Instructor>, Error> {
        match course.instructor_id {
            Some(id) => self.store().instructors().get(id),
            None => Ok(None),
        }
    }

    pub fn enrollments(&self, course_id: u64) -> Result<Vec<Enrollment>, Error> {
        self.store().enrollments().where_eq("course_id", course_id)
    }

    /// Students registered in the course, each with its enrollment row.
    pub fn students(&self, course_id: u64) -> Result<Vec<(Student, Enrollment)>, Error> {
        let students = self.store().students();
        self.enrollments(course_id)?
            .into_iter()
            .map(|enrollment| Ok((students.find(enrollment.student_id)?, enrollment)))
            .collect()
    }
}
