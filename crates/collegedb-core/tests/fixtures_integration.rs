//! Integration tests for the fixture loader and relationship navigation.

use chrono::NaiveDate;
use collegedb_core::{load_fixtures, EnrollmentStatus, Entity, Store, StoreConfig};
use rust_decimal::Decimal;

fn seeded() -> (Store, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(StoreConfig::new(dir.path())).unwrap();
    load_fixtures(&store).unwrap();
    (store, dir)
}

/// Table contents without write timestamps.
fn snapshot(store: &Store) -> Vec<(String, u64, String)> {
    let mut rows = Vec::new();
    for entity in store.schema().entity_names() {
        for stored in store.scan(entity).unwrap() {
            let text = String::from_utf8(stored.row.to_bytes().unwrap()).unwrap();
            rows.push((entity.to_string(), stored.id, text));
        }
    }
    rows
}

#[test]
fn loading_twice_yields_same_state() {
    let (store, _dir) = seeded();
    let first = snapshot(&store);

    let summary = load_fixtures(&store).unwrap();
    assert_eq!(summary.total(), 24);
    assert_eq!(snapshot(&store), first);

    // ids restart after truncation
    let ids: Vec<u64> = store
        .departments()
        .all()
        .unwrap()
        .iter()
        .map(|d| d.id())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn loading_over_modified_store_restores_fixtures() {
    let (store, _dir) = seeded();
    let first = snapshot(&store);

    let cs = store.departments().by_name("Computer Science").unwrap().unwrap();
    store.students().delete(1).unwrap();
    let mut course = store.courses().by_code("CS101").unwrap().unwrap();
    course.credits = 5;
    store.courses().update(&course).unwrap();
    assert!(store.departments().delete(cs.department_id).is_err());

    load_fixtures(&store).unwrap();
    assert_eq!(snapshot(&store), first);
}

#[test]
fn fixture_values() {
    let (store, _dir) = seeded();

    let cs = store.departments().by_name("Computer Science").unwrap().unwrap();
    assert_eq!(cs.building.as_deref(), Some("Building A"));
    assert_eq!(cs.budget, Some(Decimal::new(50000000, 2)));

    let anna = store
        .students()
        .by_email("anna.kask@student.college.edu")
        .unwrap()
        .unwrap();
    assert_eq!(anna.full_name(), "Anna Kask");
    assert_eq!(anna.gpa, Some(Decimal::new(420, 2)));
    assert_eq!(anna.date_of_birth, NaiveDate::from_ymd_opt(2003, 5, 15));
    assert_eq!(
        store.students().major(&anna).unwrap().map(|d| d.department_name),
        Some("Computer Science".to_string())
    );

    let pending = store
        .enrollments()
        .for_pair(2, 3)
        .unwrap()
        .unwrap();
    assert_eq!(pending.grade, None);
    assert_eq!(pending.status_kind().unwrap(), EnrollmentStatus::Active);
}

#[test]
fn navigation_follows_references() {
    let (store, _dir) = seeded();
    let departments = store.departments();
    let cs = departments.by_name("Computer Science").unwrap().unwrap();

    let staff: Vec<String> = departments
        .instructors(cs.department_id)
        .unwrap()
        .iter()
        .map(|i| i.full_name())
        .collect();
    assert_eq!(staff, vec!["John Smith", "Maria Garcia"]);

    let head = departments.head(cs.department_id).unwrap().unwrap();
    let garcia = store.department_heads().instructor(&head).unwrap();
    assert_eq!(garcia.email, "maria.garcia@college.edu");
    assert_eq!(
        store.instructors().head_of(garcia.instructor_id).unwrap(),
        Some(head)
    );

    let codes: Vec<String> = departments
        .courses(cs.department_id)
        .unwrap()
        .into_iter()
        .map(|c| c.course_code)
        .collect();
    assert_eq!(codes, vec!["CS101", "CS201"]);
    assert_eq!(departments.students(cs.department_id).unwrap().len(), 2);

    let cs101 = store.courses().by_code("CS101").unwrap().unwrap();
    let roster: Vec<(String, Option<String>)> = store
        .courses()
        .students(cs101.course_id)
        .unwrap()
        .into_iter()
        .map(|(student, enrollment)| (student.first_name, enrollment.grade))
        .collect();
    assert_eq!(
        roster,
        vec![
            ("Anna".to_string(), Some("5".to_string())),
            ("Peeter".to_string(), Some("4".to_string())),
        ]
    );
    assert_eq!(
        store.courses().instructor(&cs101).unwrap().map(|i| i.last_name),
        Some("Smith".to_string())
    );
    assert_eq!(
        store.courses().department(&cs101).unwrap().department_id,
        cs.department_id
    );

    let taken: Vec<String> = store
        .students()
        .courses(1)
        .unwrap()
        .into_iter()
        .map(|(course, _)| course.course_code)
        .collect();
    assert_eq!(taken, vec!["CS101", "CS201"]);

    let smith = store
        .instructors()
        .by_email("john.smith@college.edu")
        .unwrap()
        .unwrap();
    assert_eq!(store.instructors().courses(smith.instructor_id).unwrap().len(), 1);
    assert_eq!(
        store.instructors().department(&smith).unwrap().department_name,
        "Computer Science"
    );
}

#[test]
fn fixtures_exercise_delete_rules() {
    let (store, _dir) = seeded();

    // courses and instructors still reference mathematics
    let err = store.departments().delete(2).unwrap_err();
    assert!(err.is_restricted_delete());

    // david johnson heads mathematics and teaches calculus
    let result = store.instructors().delete(3).unwrap();
    assert_eq!(result.deleted_of("department_heads"), 1);
    assert_eq!(result.nullified_fields.len(), 1);
    assert!(store.departments().head(2).unwrap().is_none());
    assert_eq!(store.courses().by_code("MATH101").unwrap().unwrap().instructor_id, None);

    let result = store.courses().delete(3).unwrap();
    assert_eq!(result.deleted_of("enrollments"), 2);
    assert_eq!(store.enrollments().count().unwrap(), 4);

    // mathematics is now free of restricting rows; liis loses the major
    store.departments().delete(2).unwrap();
    let liis = store
        .students()
        .by_email("liis.mets@student.college.edu")
        .unwrap()
        .unwrap();
    assert_eq!(liis.major_department_id, None);
}
