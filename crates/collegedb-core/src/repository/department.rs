use super::Repository;
use crate::error::Error;
use crate::model::{Course, Department, DepartmentHead, Instructor, Student};

impl Repository<'_, Department> {
    pub fn by_name(&self, name: &str) -> Result<Option<Department>, Error> {
        self.first_where("department_name", name)
    }

    /// Instructors employed by the department.
    pub fn instructors(&self, department_id: u64) -> Result<Vec<Instructor>, Error> {
        self.store()
            .instructors()
            .where_eq("department_id", department_id)
    }

    /// Courses offered by the department.
    pub fn courses(&self, department_id: u64) -> Result<Vec<Course>, Error> {
        self.store().courses().where_eq("department_id", department_id)
    }

    /// Students majoring in the department.
    pub fn students(&self, department_id: u64) -> Result<Vec<Student>, Error> {
        self.store()
            .students()
            .where_eq("major_department_id", department_id)
    }

    /// Current head of the department.
    pub fn head(&self, department_id: u64) -> Result<Option<DepartmentHead>, Error> {
        self.store().department_heads().get(department_id)
    }
}
