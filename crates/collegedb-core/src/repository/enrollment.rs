use chrono::NaiveDate;

use super::Repository;
use crate::error::Error;
use crate::model::{Course, Enrollment, NewEnrollment, Student};

impl Repository<'_, Enrollment> {
    /// Register a student in a course with the default status.
    pub fn enroll(
        &self,
        student_id: u64,
        course_id: u64,
        enrollment_date: NaiveDate,
    ) -> Result<Enrollment, Error> {
        self.insert(NewEnrollment::new(student_id, course_id, enrollment_date))
    }

    /// The enrollment of `student_id` in `course_id`, if any.
    pub fn for_pair(&self, student_id: u64, course_id: u64) -> Result<Option<Enrollment>, Error> {
        Ok(self
            .where_eq("student_id", student_id)?
            .into_iter()
            .find(|enrollment| enrollment.course_id == course_id))
    }

    pub fn student(&self, enrollment: &Enrollment) -> Result<Student, Error> {
        self.store().students().find(enrollment.student_id)
    }

    pub fn course(&self, enrollment: &Enrollment) -> Result<Course, Error> {
        self.store().courses().find(enrollment.course_id)
    }
}
