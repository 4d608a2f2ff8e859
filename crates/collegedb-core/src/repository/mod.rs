//! Typed access to the college tables.
//!
//! A [`Repository`] borrows the [`Store`] and converts between rows and the
//! plain records of [`crate::model`]. Every write goes through the store, so
//! the full constraint set applies. Relationship navigation lives in
//! per-table `impl` blocks.

mod course;
mod department;
mod department_head;
mod enrollment;
mod instructor;
mod student;

use std::marker::PhantomData;

use crate::cascade::CascadeResult;
use crate::error::Error;
use crate::model::{Course, Department, DepartmentHead, Enrollment, Entity, Instructor, Student};
use crate::store::Store;
use crate::value::Value;

/// Access layer for one table.
pub struct Repository<'a, T> {
    store: &'a Store,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Repository<'_, T> {}

impl<'a, T: Entity> Repository<'a, T> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// The store this repository writes to.
    pub fn store(&self) -> &'a Store {
        self.store
    }

    /// Insert a new record. Omitted defaults are filled by the store.
    pub fn insert(&self, new: T::New) -> Result<T, Error> {
        let stored = self.store.insert(T::ENTITY, new.into())?;
        T::from_stored(&stored)
    }

    /// Get a record by identity.
    pub fn get(&self, id: u64) -> Result<Option<T>, Error> {
        self.store
            .get(T::ENTITY, id)?
            .map(|stored| T::from_stored(&stored))
            .transpose()
    }

    /// Get a record by identity, failing with `NotFound` when absent.
    pub fn find(&self, id: u64) -> Result<T, Error> {
        T::from_stored(&self.store.find(T::ENTITY, id)?)
    }

    /// Every record in identity order.
    pub fn all(&self) -> Result<Vec<T>, Error> {
        self.store
            .scan(T::ENTITY)?
            .iter()
            .map(T::from_stored)
            .collect()
    }

    /// Write every non-key field of `record`, returning the committed state.
    pub fn update(&self, record: &T) -> Result<T, Error> {
        let stored = self.store.update(T::ENTITY, record.id(), record.to_row())?;
        T::from_stored(&stored)
    }

    /// Delete a record, applying the delete rules of its dependents.
    pub fn delete(&self, id: u64) -> Result<CascadeResult, Error> {
        self.store.delete(T::ENTITY, id)
    }

    pub fn count(&self) -> Result<usize, Error> {
        self.store.count(T::ENTITY)
    }

    /// Records whose `field` equals `value`.
    pub fn where_eq(&self, field: &str, value: impl Into<Value>) -> Result<Vec<T>, Error> {
        self.store
            .find_by(T::ENTITY, field, &value.into())?
            .iter()
            .map(T::from_stored)
            .collect()
    }

    /// First record whose `field` equals `value`.
    pub fn first_where(&self, field: &str, value: impl Into<Value>) -> Result<Option<T>, Error> {
        Ok(self.where_eq(field, value)?.into_iter().next())
    }
}

impl Store {
    /// Repository for any table of the college schema.
    pub fn repository<T: Entity>(&self) -> Repository<'_, T> {
        Repository::new(self)
    }

    pub fn departments(&self) -> Repository<'_, Department> {
        self.repository()
    }

    pub fn instructors(&self) -> Repository<'_, Instructor> {
        self.repository()
    }

    pub fn department_heads(&self) -> Repository<'_, DepartmentHead> {
        self.repository()
    }

    pub fn courses(&self) -> Repository<'_, Course> {
        self.repository()
    }

    pub fn students(&self) -> Repository<'_, Student> {
        self.repository()
    }

    pub fn enrollments(&self) -> Repository<'_, Enrollment> {
        self.repository()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::model::NewDepartment;
    use crate::store::StoreConfig;

    #[test]
    fn test_crud_round() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let departments = store.departments();

        let mut cs = departments
            .insert(NewDepartment::new("Computer Science").building("Building A"))
            .unwrap();
        assert_eq!(cs.department_id, 1);
        assert_eq!(cs.budget, None);

        cs.budget = Some(Decimal::new(50000000, 2));
        let updated = departments.update(&cs).unwrap();
        assert_eq!(updated.budget, Some(Decimal::new(500000, 0)));
        assert_eq!(updated.timestamps.created_at, cs.timestamps.created_at);

        assert_eq!(departments.find(1).unwrap().budget, updated.budget);
        assert_eq!(departments.count().unwrap(), 1);
        assert_eq!(departments.all().unwrap().len(), 1);

        departments.delete(1).unwrap();
        assert!(departments.get(1).unwrap().is_none());
        assert!(departments.find(1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_where_eq() {
        let store = Store::open(StoreConfig::temporary()).unwrap();
        let departments = store.departments();
        departments
            .insert(NewDepartment::new("Mathematics").building("Building B"))
            .unwrap();
        departments
            .insert(NewDepartment::new("Physics").building("Building B"))
            .unwrap();
        departments.insert(NewDepartment::new("Business Administration")).unwrap();

        assert_eq!(departments.where_eq("building", "Building B").unwrap().len(), 2);
        assert_eq!(departments.where_eq("building", Value::Null).unwrap().len(), 1);
        assert!(departments
            .first_where("department_name", "Chemistry")
            .unwrap()
            .is_none());
    }
}
