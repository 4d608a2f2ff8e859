//! Transaction support for atomic multi-key operations.

use std::collections::{BTreeMap, HashMap};

use super::key::{entity_prefix, sequence_key, RowKey};
use super::{Record, StorageEngine};
use crate::error::Error;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;

/// A pending operation in a transaction.
#[derive(Debug, Clone)]
enum TransactionOp {
    /// Write a row.
    Put {
        /// Entity name.
        entity: String,
        /// Row identity.
        id: u64,
        /// Record to store.
        record: Record,
    },
    /// Remove a row.
    Delete {
        /// Entity name.
        entity: String,
        /// Row identity.
        id: u64,
    },
    /// Point a unique index key at a row.
    IndexPut {
        /// Encoded index key.
        key: Vec<u8>,
        /// Owning row identity.
        id: u64,
    },
    /// Drop a unique index key.
    IndexRemove {
        /// Encoded index key.
        key: Vec<u8>,
    },
}

/// A transaction for atomic multi-key operations.
///
/// Operations are collected and executed atomically on commit. Reads
/// through the transaction see its own uncommitted writes.
pub struct Transaction<'a> {
    engine: &'a StorageEngine,
    ops: Vec<TransactionOp>,
    /// Uncommitted row writes (encoded row key -> record, None for delete).
    write_cache: HashMap<Vec<u8>, Option<Record>>,
    /// Uncommitted unique index writes.
    index_cache: HashMap<Vec<u8>, Option<u64>>,
    /// Sequence values to persist on commit.
    sequences: HashMap<String, u64>,
}

impl<'a> Transaction<'a> {
    /// Create a new transaction.
    pub(crate) fn new(engine: &'a StorageEngine) -> Self {
        Self {
            engine,
            ops: Vec::new(),
            write_cache: HashMap::new(),
            index_cache: HashMap::new(),
            sequences: HashMap::new(),
        }
    }

    /// Queue a row write.
    pub fn put(&mut self, entity: impl Into<String>, id: u64, record: Record) -> &mut Self {
        let entity = entity.into();
        self.write_cache
            .insert(RowKey::new(&entity, id).encode(), Some(record.clone()));
        self.ops.push(TransactionOp::Put { entity, id, record });
        self
    }

    /// Queue a row removal.
    pub fn delete(&mut self, entity: impl Into<String>, id: u64) -> &mut Self {
        let entity = entity.into();
        self.write_cache.insert(RowKey::new(&entity, id).encode(), None);
        self.ops.push(TransactionOp::Delete { entity, id });
        self
    }

    /// Read a row within the transaction.
    pub fn read(&self, entity: &str, id: u64) -> Result<Option<Record>, Error> {
        if let Some(cached) = self.write_cache.get(&RowKey::new(entity, id).encode()) {
            return Ok(cached.clone());
        }
        self.engine.get(entity, id)
    }

    /// Check if a row exists (for foreign key validation).
    pub fn exists(&self, entity: &str, id: u64) -> Result<bool, Error> {
        if let Some(cached) = self.write_cache.get(&RowKey::new(entity, id).encode()) {
            return Ok(cached.is_some());
        }
        self.engine.contains(entity, id)
    }

    /// Scan all rows of an entity as this transaction sees them, in id order.
    pub fn scan(&self, entity: &str) -> Result<Vec<(u64, Record)>, Error> {
        let mut rows = BTreeMap::new();
        for result in self.engine.scan(entity) {
            let (id, record) = result?;
            rows.insert(id, record);
        }

        let prefix = entity_prefix(entity);
        for (key, cached) in &self.write_cache {
            if !key.starts_with(&prefix) {
                continue;
            }
            let Some(id) = RowKey::decode_id(entity, key) else {
                continue;
            };
            match cached {
                Some(record) => {
                    rows.insert(id, record.clone());
                }
                None => {
                    rows.remove(&id);
                }
            }
        }

        Ok(rows.into_iter().collect())
    }

    /// Allocate the next id for an entity.
    pub fn next_id(&mut self, entity: &str) -> Result<u64, Error> {
        let current = match self.sequences.get(entity) {
            Some(value) => *value,
            None => self.engine.sequence(entity)?,
        };
        let next = current + 1;
        self.sequences.insert(entity.to_string(), next);
        Ok(next)
    }

    /// Reset an entity's sequence so the next id is 1.
    pub fn reset_sequence(&mut self, entity: &str) -> &mut Self {
        self.sequences.insert(entity.to_string(), 0);
        self
    }

    /// Look up a unique index entry.
    pub fn index_get(&self, key: &[u8]) -> Result<Option<u64>, Error> {
        if let Some(cached) = self.index_cache.get(key) {
            return Ok(*cached);
        }
        self.engine.index_get(key)
    }

    /// Queue a unique index entry.
    pub fn index_put(&mut self, key: Vec<u8>, id: u64) -> &mut Self {
        self.index_cache.insert(key.clone(), Some(id));
        self.ops.push(TransactionOp::IndexPut { key, id });
        self
    }

    /// Queue removal of a unique index entry.
    pub fn index_remove(&mut self, key: Vec<u8>) -> &mut Self {
        self.index_cache.insert(key.clone(), None);
        self.ops.push(TransactionOp::IndexRemove { key });
        self
    }

    /// Unique index keys with the given prefix as this transaction sees them.
    pub fn index_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
        let mut keys: Vec<Vec<u8>> = self
            .engine
            .index_keys(prefix)?
            .into_iter()
            .filter(|k| !matches!(self.index_cache.get(k), Some(None)))
            .collect();
        for (key, cached) in &self.index_cache {
            if cached.is_some() && key.starts_with(prefix) && !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        Ok(keys)
    }

    /// Get the number of pending operations.
    pub fn operation_count(&self) -> usize {
        self.ops.len()
    }

    /// Commit the transaction atomically.
    ///
    /// All operations succeed or none do.
    pub fn commit(self) -> Result<(), Error> {
        if self.ops.is_empty() && self.sequences.is_empty() {
            return Ok(());
        }

        let mut data_writes: Vec<(Vec<u8>, Option<Vec<u8>>)> = Vec::new();
        let mut index_writes: Vec<(Vec<u8>, Option<[u8; 8]>)> = Vec::new();
        for op in &self.ops {
            match op {
                TransactionOp::Put { entity, id, record } => {
                    data_writes.push((RowKey::new(entity, *id).encode(), Some(record.to_bytes()?)));
                }
                TransactionOp::Delete { entity, id } => {
                    data_writes.push((RowKey::new(entity, *id).encode(), None));
                }
                TransactionOp::IndexPut { key, id } => {
                    index_writes.push((key.clone(), Some(id.to_be_bytes())));
                }
                TransactionOp::IndexRemove { key } => {
                    index_writes.push((key.clone(), None));
                }
            }
        }
        let sequence_writes: Vec<(Vec<u8>, [u8; 8])> = self
            .sequences
            .iter()
            .map(|(entity, value)| (sequence_key(entity), value.to_be_bytes()))
            .collect();

        let data_tree = self.engine.data_tree();
        let meta_tree = self.engine.meta_tree();
        let index_tree = self.engine.index_tree();

        let result: Result<(), TransactionError<Error>> =
            (data_tree, meta_tree, index_tree).transaction(|(data_tx, meta_tx, index_tx)| {
                for (key, value) in &data_writes {
                    match value {
                        Some(bytes) => {
                            data_tx.insert(key.as_slice(), bytes.as_slice())?;
                        }
                        None => {
                            data_tx.remove(key.as_slice())?;
                        }
                    }
                }
                for (key, value) in &index_writes {
                    match value {
                        Some(id) => {
                            index_tx.insert(key.as_slice(), &id[..])?;
                        }
                        None => {
                            index_tx.remove(key.as_slice())?;
                        }
                    }
                }
                for (key, value) in &sequence_writes {
                    meta_tx.insert(key.as_slice(), &value[..])?;
                }
                Ok::<(), ConflictableTransactionError<Error>>(())
            });

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(Error::Storage(e)),
        }
    }
}
