//! Catalog manager for storing and retrieving schema metadata.

use super::SchemaBundle;
use crate::error::Error;
use parking_lot::RwLock;
use sled::{Db, Tree};
use std::sync::atomic::{AtomicU64, Ordering};

/// Tree name for schema bundles.
const SCHEMA_TREE: &str = "catalog:schemas";

/// Tree name for catalog metadata.
const META_TREE: &str = "catalog:meta";

/// Key for current schema version in meta tree.
const CURRENT_VERSION_KEY: &[u8] = b"current_version";

/// The catalog manager for schema metadata.
pub struct Catalog {
    /// Schema bundles tree.
    schema_tree: Tree,
    /// Metadata tree.
    meta_tree: Tree,
    /// Current schema version (cached).
    current_version: AtomicU64,
    /// Current schema (cached).
    current_schema: RwLock<Option<SchemaBundle>>,
}

impl Catalog {
    /// Open or create a catalog using the given sled database.
    pub fn open(db: &Db) -> Result<Self, Error> {
        let schema_tree = db.open_tree(SCHEMA_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;

        let current_version = match meta_tree.get(CURRENT_VERSION_KEY)? {
            Some(bytes) => decode_version(&bytes)?,
            None => 0,
        };

        let catalog = Self {
            schema_tree,
            meta_tree,
            current_version: AtomicU64::new(current_version),
            current_schema: RwLock::new(None),
        };

        if current_version > 0 {
            if let Some(schema) = catalog.schema_at_version(current_version)? {
                *catalog.current_schema.write() = Some(schema);
            }
        }

        Ok(catalog)
    }

    /// Get the current schema version.
    pub fn current_version(&self) -> u64 {
        self.current_version.load(Ordering::SeqCst)
    }

    /// Get the current schema bundle.
    pub fn current_schema(&self) -> Option<SchemaBundle> {
        self.current_schema.read().clone()
    }

    /// Get a schema bundle at a specific version.
    pub fn schema_at_version(&self, version: u64) -> Result<Option<SchemaBundle>, Error> {
        let key = version.to_be_bytes();
        match self.schema_tree.get(key)? {
            Some(bytes) => Ok(Some(SchemaBundle::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Register a schema bundle.
    ///
    /// The bundle is validated first. If its definition equals the current
    /// schema nothing is written and the current version is returned;
    /// otherwise it is stored under the next version.
    pub fn apply_schema(&self, mut bundle: SchemaBundle) -> Result<u64, Error> {
        bundle.validate()?;

        let mut cached = self.current_schema.write();
        if let Some(current) = cached.as_ref() {
            if current.same_definition(&bundle) {
                return Ok(current.version);
            }
        }

        let new_version = self.current_version() + 1;
        bundle.version = new_version;

        let key = new_version.to_be_bytes();
        self.schema_tree.insert(key, bundle.to_bytes()?)?;
        self.meta_tree
            .insert(CURRENT_VERSION_KEY, &new_version.to_be_bytes())?;

        self.current_version.store(new_version, Ordering::SeqCst);
        tracing::info!(
            version = new_version,
            entities = bundle.entities.len(),
            relations = bundle.relations.len(),
            constraints = bundle.constraints.len(),
            "schema registered"
        );
        *cached = Some(bundle);

        Ok(new_version)
    }

    /// List all schema versions.
    pub fn list_versions(&self) -> Result<Vec<u64>, Error> {
        let mut versions = Vec::new();
        for result in self.schema_tree.iter() {
            let (key, _) = result?;
            versions.push(decode_version(&key)?);
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.schema_tree.flush()?;
        self.meta_tree.flush()?;
        Ok(())
    }
}

fn decode_version(bytes: &[u8]) -> Result<u64, Error> {
    let buf: [u8; 8] = bytes
        .try_into()
        .map_err(|_| Error::InvalidData(format!("bad schema version key of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConstraintDef, EntityDef, FieldDef, RelationDef, ScalarType};

    fn sample_schema() -> SchemaBundle {
        let department = EntityDef::new("departments", "department_id")
            .with_field(FieldDef::new(
                "department_name",
                ScalarType::String { max_len: 100 },
            ));

        let instructor = EntityDef::new("instructors", "instructor_id")
            .with_field(FieldDef::new("email", ScalarType::String { max_len: 100 }))
            .with_field(FieldDef::new("department_id", ScalarType::Int64));

        let relation = RelationDef::one_to_many(
            "instructors_department_fk",
            "instructors",
            "department_id",
            "departments",
        );
        let unique = ConstraintDef::unique("instructors_email_unique", "instructors", "email");

        SchemaBundle::new(0)
            .with_entity(department)
            .with_entity(instructor)
            .with_relation(relation)
            .with_constraint(unique)
    }

    fn test_db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    #[test]
    fn test_catalog_open_empty() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();

        assert_eq!(catalog.current_version(), 0);
        assert!(catalog.current_schema().is_none());
    }

    #[test]
    fn test_apply_schema() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();

        let version = catalog.apply_schema(sample_schema()).unwrap();

        assert_eq!(version, 1);
        assert_eq!(catalog.current_version(), 1);
        assert_eq!(catalog.current_schema().unwrap().version, 1);
        let schema = catalog.current_schema().unwrap();
        assert_eq!(schema.entities.len(), 2);
        assert_eq!(schema.relations_to("departments").len(), 1);
    }

    #[test]
    fn test_apply_same_schema_is_noop() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();

        assert_eq!(catalog.apply_schema(sample_schema()).unwrap(), 1);
        assert_eq!(catalog.apply_schema(sample_schema()).unwrap(), 1);
        assert_eq!(catalog.list_versions().unwrap(), vec![1]);
    }

    #[test]
    fn test_apply_invalid_schema() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();

        let bad = sample_schema().with_constraint(ConstraintDef::unique(
            "instructors_phone_unique",
            "instructors",
            "phone",
        ));
        assert!(matches!(catalog.apply_schema(bad), Err(Error::Schema(_))));
        assert_eq!(catalog.current_version(), 0);
    }

    #[test]
    fn test_schema_versioning() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();

        assert_eq!(catalog.apply_schema(sample_schema()).unwrap(), 1);

        let extended = sample_schema().with_entity(
            EntityDef::new("students", "student_id")
                .with_field(FieldDef::new("email", ScalarType::String { max_len: 100 })),
        );
        assert_eq!(catalog.apply_schema(extended).unwrap(), 2);

        let v1 = catalog.schema_at_version(1).unwrap().unwrap();
        assert_eq!(v1.entities.len(), 2);
        let v2 = catalog.schema_at_version(2).unwrap().unwrap();
        assert_eq!(v2.entities.len(), 3);

        assert_eq!(catalog.list_versions().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let config = sled::Config::new().path(dir.path());

        {
            let db = config.clone().open().unwrap();
            let catalog = Catalog::open(&db).unwrap();
            catalog.apply_schema(sample_schema()).unwrap();
            catalog.flush().unwrap();
        }

        {
            let db = config.open().unwrap();
            let catalog = Catalog::open(&db).unwrap();

            assert_eq!(catalog.current_version(), 1);
            let schema = catalog.current_schema().unwrap();
            assert_eq!(schema.entities.len(), 2);
            assert_eq!(catalog.apply_schema(sample_schema()).unwrap(), 1);
        }
    }
}
