//! Fixture loading.
//!
//! [`load_fixtures`] resets the store and writes the reference data set:
//! three departments with their staff, heads, courses, students and
//! enrollments. Loading twice leaves the same state as loading once.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::error::Error;
use crate::model::{
    EnrollmentStatus, NewCourse, NewDepartment, NewEnrollment, NewInstructor, NewStudent,
};
use crate::store::Store;

/// Number of rows written per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub departments: usize,
    pub instructors: usize,
    pub department_heads: usize,
    pub courses: usize,
    pub students: usize,
    pub enrollments: usize,
}

impl SeedSummary {
    pub fn total(&self) -> usize {
        self.departments
            + self.instructors
            + self.department_heads
            + self.courses
            + self.students
            + self.enrollments
    }
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Error> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| Error::InvalidData(format!("invalid fixture date {y}-{m}-{d}")))
}

/// Truncate every table and load the fixture set.
pub fn load_fixtures(store: &Store) -> Result<SeedSummary, Error> {
    store.truncate_all()?;
    let mut summary = SeedSummary::default();

    let departments = store.departments();
    let mut department_ids = Vec::new();
    for (name, building, budget) in [
        ("Computer Science", "Building A", 500_000),
        ("Mathematics", "Building B", 350_000),
        ("Business Administration", "Building C", 450_000),
    ] {
        let department = departments.insert(
            NewDepartment::new(name)
                .building(building)
                .budget(Decimal::new(budget * 100, 2)),
        )?;
        department_ids.push(department.department_id);
        summary.departments += 1;
    }

    let instructors = store.instructors();
    let mut instructor_ids = Vec::new();
    for (first, last, email, phone, department, salary, hired) in [
        ("John", "Smith", "john.smith@college.edu", "+372-555-0001", 0, 65_000, date(2020, 9, 1)?),
        ("Maria", "Garcia", "maria.garcia@college.edu", "+372-555-0002", 0, 68_000, date(2019, 8, 15)?),
        ("David", "Johnson", "david.johnson@college.edu", "+372-555-0003", 1, 62_000, date(2021, 1, 10)?),
        ("Sarah", "Williams", "sarah.williams@college.edu", "+372-555-0004", 2, 70_000, date(2018, 7, 1)?),
    ] {
        let instructor = instructors.insert(
            NewInstructor::new(first, last, email, department_ids[department])
                .phone(phone)
                .salary(Decimal::new(salary * 100, 2))
                .hire_date(hired),
        )?;
        instructor_ids.push(instructor.instructor_id);
        summary.instructors += 1;
    }

    let heads = store.department_heads();
    for (department, instructor, start) in [
        (0, 1, date(2022, 1, 1)?),
        (1, 2, date(2023, 1, 1)?),
        (2, 3, date(2021, 9, 1)?),
    ] {
        heads.assign(department_ids[department], instructor_ids[instructor], start)?;
        summary.department_heads += 1;
    }

    let courses = store.courses();
    let mut course_ids = Vec::new();
    for (code, name, department, instructor, credits, room, schedule) in [
        ("CS101", "Introduction to Programming", 0, 0, 3, "A-101", "Mon/Wed 10:00-11:30"),
        ("CS201", "Data Structures", 0, 1, 4, "A-102", "Tue/Thu 14:00-16:00"),
        ("MATH101", "Calculus I", 1, 2, 4, "B-201", "Mon/Wed/Fri 09:00-10:00"),
        ("BUS101", "Business Fundamentals", 2, 3, 3, "C-301", "Tue/Thu 10:00-11:30"),
    ] {
        let course = courses.insert(
            NewCourse::new(code, name, department_ids[department])
                .instructor(instructor_ids[instructor])
                .credits(credits)
                .term("Autumn 2024", 2024)
                .room(room)
                .schedule(schedule),
        )?;
        course_ids.push(course.course_id);
        summary.courses += 1;
    }

    let students = store.students();
    let mut student_ids = Vec::new();
    for (first, last, email, phone, born, year, major, gpa) in [
        ("Anna", "Kask", "anna.kask@student.college.edu", "+372-555-1001", date(2003, 5, 15)?, 2023, 0, 420),
        ("Peeter", "Tamm", "peeter.tamm@student.college.edu", "+372-555-1002", date(2002, 8, 22)?, 2022, 0, 380),
        ("Liis", "Mets", "liis.mets@student.college.edu", "+372-555-1003", date(2003, 11, 30)?, 2023, 1, 450),
        ("Martin", "Saar", "martin.saar@student.college.edu", "+372-555-1004", date(2002, 3, 10)?, 2022, 2, 390),
    ] {
        let student = students.insert(
            NewStudent::new(first, last, email)
                .phone(phone)
                .born(born)
                .enrolled_in(year)
                .major(department_ids[major])
                .gpa(Decimal::new(gpa, 2)),
        )?;
        student_ids.push(student.student_id);
        summary.students += 1;
    }

    let enrollments = store.enrollments();
    let enrolled_on = date(2024, 9, 1)?;
    for (student, course, grade, status) in [
        (0, 0, Some("5"), EnrollmentStatus::Completed),
        (0, 1, Some("A"), EnrollmentStatus::Active),
        (1, 0, Some("4"), EnrollmentStatus::Completed),
        (1, 2, None, EnrollmentStatus::Active),
        (2, 2, Some("MA"), EnrollmentStatus::Completed),
        (3, 3, Some("5"), EnrollmentStatus::Active),
    ] {
        let mut new = NewEnrollment::new(student_ids[student], course_ids[course], enrolled_on)
            .status(status);
        new.grade = grade.map(str::to_string);
        enrollments.insert(new)?;
        summary.enrollments += 1;
    }

    info!(
        departments = summary.departments,
        instructors = summary.instructors,
        department_heads = summary.department_heads,
        courses = summary.courses,
        students = summary.students,
        enrollments = summary.enrollments,
        "fixtures loaded"
    );
    Ok(summary)
}
