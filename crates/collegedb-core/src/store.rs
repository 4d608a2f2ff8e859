//! Store facade combining storage, catalog and constraint enforcement.
//!
//! Every write runs validation, cascades and commit inside one critical
//! section and one sled transaction, so a write is applied entirely or not
//! at all and readers only ever see committed state.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cascade::{CascadeExecutor, CascadeResult};
use crate::catalog::{Catalog, EntityDef, SchemaBundle};
use crate::constraint::{ConstraintValidator, UniqueIndex};
use crate::error::{ConstraintError, Error};
use crate::storage::{Record, StorageConfig, StorageEngine, Transaction};
use crate::value::{Row, Value};

/// Configuration for a [`Store`].
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Storage engine settings.
    pub storage: StorageConfig,
    /// Enforce check constraints and column widths.
    pub enforce_checks: bool,
}

impl StoreConfig {
    /// Create a configuration for a store at `path`.
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            storage: StorageConfig::new(path),
            enforce_checks: false,
        }
    }

    /// Create a temporary configuration for testing.
    pub fn temporary() -> Self {
        Self {
            storage: StorageConfig::temporary(),
            enforce_checks: false,
        }
    }

    /// Replace the storage settings.
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Enable or disable check constraint enforcement.
    pub fn with_enforce_checks(mut self, enforce: bool) -> Self {
        self.enforce_checks = enforce;
        self
    }
}

/// A committed row together with its identity and write timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    /// Row identity.
    pub id: u64,
    /// Field values.
    pub row: Row,
    /// Creation timestamp in microseconds since Unix epoch.
    pub created_at: u64,
    /// Last update timestamp in microseconds since Unix epoch.
    pub updated_at: u64,
}

impl StoredRow {
    fn from_record(id: u64, record: &Record) -> Result<Self, Error> {
        Ok(Self {
            id,
            row: Row::from_bytes(&record.data)?,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Constraint-enforcing data store.
pub struct Store {
    engine: StorageEngine,
    catalog: Catalog,
    schema: SchemaBundle,
    enforce_checks: bool,
    /// Serializes writers so checks and commit form one critical section.
    write_lock: Mutex<()>,
}

impl Store {
    /// Open a store with the college schema.
    pub fn open(config: StoreConfig) -> Result<Self, Error> {
        Self::open_with_schema(config, crate::model::college_schema())
    }

    /// Open a store and register `schema` in its catalog.
    pub fn open_with_schema(config: StoreConfig, schema: SchemaBundle) -> Result<Self, Error> {
        let engine = StorageEngine::open(config.storage.clone())?;
        let catalog = Catalog::open(engine.db())?;
        let version = catalog.apply_schema(schema)?;
        let schema = catalog
            .current_schema()
            .ok_or_else(|| Error::Schema("catalog has no current schema".into()))?;

        info!(
            path = %config.storage.path.display(),
            temporary = config.storage.temporary,
            recovered = engine.was_recovered(),
            schema_version = version,
            enforce_checks = config.enforce_checks,
            "store opened"
        );

        Ok(Self {
            engine,
            catalog,
            schema,
            enforce_checks: config.enforce_checks,
            write_lock: Mutex::new(()),
        })
    }

    /// The registered schema.
    pub fn schema(&self) -> &SchemaBundle {
        &self.schema
    }

    /// Version of the registered schema.
    pub fn schema_version(&self) -> u64 {
        self.catalog.current_version()
    }

    /// Every schema version recorded in the catalog.
    pub fn schema_versions(&self) -> Result<Vec<u64>, Error> {
        self.catalog.list_versions()
    }

    /// Whether check constraints are enforced.
    pub fn enforces_checks(&self) -> bool {
        self.enforce_checks
    }

    fn validator(&self) -> ConstraintValidator<'_> {
        ConstraintValidator::new(&self.schema, self.enforce_checks)
    }

    /// Insert a row, returning it with its identity and applied defaults.
    pub fn insert(&self, entity: &str, row: Row) -> Result<StoredRow, Error> {
        let _guard = self.write_lock.lock();
        self.insert_locked(entity, row)
            .inspect_err(|e| log_rejection("insert", entity, e))
    }

    fn insert_locked(&self, entity: &str, mut row: Row) -> Result<StoredRow, Error> {
        let def = self.schema.entity(entity)?;
        let validator = self.validator();
        let mut tx = self.engine.transaction();

        validator.apply_defaults(def, &mut row);
        let id = self.assign_id(&mut tx, def, &row)?;
        validator.validate_insert(&mut tx, def, id, &row)?;

        let record = Record::new(row.to_bytes()?);
        let stored = StoredRow::from_record(id, &record)?;
        tx.put(entity, id, record);
        tx.commit()?;

        debug!(entity, id, "row inserted");
        Ok(stored)
    }

    /// Pick the identity of a new row.
    fn assign_id(&self, tx: &mut Transaction<'_>, def: &EntityDef, row: &Row) -> Result<u64, Error> {
        if def.is_auto_increment() {
            return tx.next_id(&def.name);
        }

        let id = match row.get(&def.identity_field) {
            None | Some(Value::Null) => {
                return Err(ConstraintError::NotNullViolation {
                    entity: def.name.clone(),
                    field: def.identity_field.clone(),
                }
                .into())
            }
            Some(value) => value.as_id().ok_or_else(|| {
                Error::InvalidData(format!(
                    "{}.{}: {} is not a valid identity",
                    def.name, def.identity_field, value
                ))
            })?,
        };

        if tx.exists(&def.name, id)? {
            return Err(ConstraintError::UniqueConstraintViolation {
                constraint: format!("{}_pkey", def.name),
                entity: def.name.clone(),
                fields: vec![def.identity_field.clone()],
                value: id.to_string(),
            }
            .into());
        }
        Ok(id)
    }

    /// Apply `changes` to an existing row.
    pub fn update(&self, entity: &str, id: u64, changes: Row) -> Result<StoredRow, Error> {
        let _guard = self.write_lock.lock();
        self.update_locked(entity, id, changes)
            .inspect_err(|e| log_rejection("update", entity, e))
    }

    fn update_locked(&self, entity: &str, id: u64, changes: Row) -> Result<StoredRow, Error> {
        let def = self.schema.entity(entity)?;
        let validator = self.validator();
        let mut tx = self.engine.transaction();

        let record = tx
            .read(entity, id)?
            .ok_or_else(|| Error::not_found(entity, id))?;
        let old = Row::from_bytes(&record.data)?;

        if let Some(value) = changes.get(&def.identity_field) {
            if old.get(&def.identity_field) != Some(value) {
                return Err(Error::ImmutableField {
                    entity: entity.to_string(),
                    field: def.identity_field.clone(),
                });
            }
        }

        let mut new = old.clone();
        new.merge(changes);
        validator.validate_update(&mut tx, def, id, &old, &new)?;

        let record = record.updated(new.to_bytes()?);
        let stored = StoredRow::from_record(id, &record)?;
        tx.put(entity, id, record);
        tx.commit()?;

        debug!(entity, id, "row updated");
        Ok(stored)
    }

    /// Delete a row, applying the delete behavior of every relation that targets it.
    pub fn delete(&self, entity: &str, id: u64) -> Result<CascadeResult, Error> {
        let _guard = self.write_lock.lock();
        self.delete_locked(entity, id)
            .inspect_err(|e| log_rejection("delete", entity, e))
    }

    fn delete_locked(&self, entity: &str, id: u64) -> Result<CascadeResult, Error> {
        self.schema.entity(entity)?;
        let validator = self.validator();
        let mut tx = self.engine.transaction();

        let record = tx
            .read(entity, id)?
            .ok_or_else(|| Error::not_found(entity, id))?;
        let row = Row::from_bytes(&record.data)?;

        let result = CascadeExecutor::new(&validator).process_delete(entity, id, &mut tx)?;
        validator.release_row(&mut tx, entity, id, &row)?;
        tx.delete(entity, id);
        tx.commit()?;

        debug!(
            entity,
            id,
            cascaded = result.deleted_entities.len(),
            nullified = result.nullified_fields.len(),
            "row deleted"
        );
        Ok(result)
    }

    /// Get a committed row.
    pub fn get(&self, entity: &str, id: u64) -> Result<Option<StoredRow>, Error> {
        self.schema.entity(entity)?;
        match self.engine.get(entity, id)? {
            Some(record) => Ok(Some(StoredRow::from_record(id, &record)?)),
            None => Ok(None),
        }
    }

    /// Get a committed row, failing if it does not exist.
    pub fn find(&self, entity: &str, id: u64) -> Result<StoredRow, Error> {
        self.get(entity, id)?
            .ok_or_else(|| Error::not_found(entity, id))
    }

    /// All committed rows of an entity in id order.
    pub fn scan(&self, entity: &str) -> Result<Vec<StoredRow>, Error> {
        self.schema.entity(entity)?;
        self.engine
            .scan(entity)
            .map(|result| {
                let (id, record) = result?;
                StoredRow::from_record(id, &record)
            })
            .collect()
    }

    /// Rows whose `field` equals `value`.
    ///
    /// Matching on the identity field of an auto-increment entity compares
    /// row ids.
    pub fn find_by(&self, entity: &str, field: &str, value: &Value) -> Result<Vec<StoredRow>, Error> {
        let def = self.schema.entity(entity)?;
        if !def.has_field(field) {
            return Err(Error::InvalidData(format!("{entity} has no field {field}")));
        }

        // a value the column cannot hold matches nothing
        if let Some(column) = def.get_field(field) {
            if !column.scalar.accepts(value) {
                return Ok(Vec::new());
            }
        }

        if def.is_auto_increment() && field == def.identity_field {
            return Ok(match value.as_id() {
                Some(id) => self.get(entity, id)?.into_iter().collect(),
                None => Vec::new(),
            });
        }

        // single-field unique lookups go through the index
        for constraint in self.schema.constraints_for(entity) {
            if constraint.is_unique() && constraint.fields() == [field] {
                if let Some(index) = UniqueIndex::for_constraint(constraint) {
                    let lookup_row = Row::new().with(field, value.clone());
                    let tx = self.engine.transaction();
                    return Ok(match index.lookup(&tx, &lookup_row)? {
                        Some(id) => self.get(entity, id)?.into_iter().collect(),
                        None => Vec::new(),
                    });
                }
            }
        }

        Ok(self
            .scan(entity)?
            .into_iter()
            .filter(|stored| stored.row.get(field).unwrap_or(&Value::Null) == value)
            .collect())
    }

    /// Number of committed rows of an entity.
    pub fn count(&self, entity: &str) -> Result<usize, Error> {
        self.schema.entity(entity)?;
        self.engine.count(entity)
    }

    /// Remove every row of every entity and reset id sequences.
    pub fn truncate_all(&self) -> Result<(), Error> {
        let _guard = self.write_lock.lock();
        let mut tx = self.engine.transaction();
        let mut removed = 0;

        for entity in self.schema.entity_names() {
            for (id, _) in tx.scan(entity)? {
                tx.delete(entity, id);
                removed += 1;
            }
            for key in tx.index_keys(&UniqueIndex::entity_prefix(entity))? {
                tx.index_remove(key);
            }
            tx.reset_sequence(entity);
        }

        tx.commit()?;
        info!(rows = removed, "store truncated");
        Ok(())
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.engine.flush()?;
        self.catalog.flush()
    }
}

fn log_rejection(op: &str, entity: &str, err: &Error) {
    match err {
        Error::ConstraintViolation(_) | Error::NotFound { .. } | Error::ImmutableField { .. } => {
            warn!(op, entity, error = %err, "write rejected");
        }
        _ => {}
    }
}
