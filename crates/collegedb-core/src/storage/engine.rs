//! Storage engine implementation.

use super::key::{entity_prefix, sequence_key, RowKey};
use super::{Record, StorageConfig, Transaction};
use crate::error::Error;
use sled::{Db, Tree};

/// Tree name for row data.
const DATA_TREE: &str = "data";

/// Tree name for metadata (id sequences).
const META_TREE: &str = "meta";

/// Tree name for the unique constraint index.
pub const UNIQUE_INDEX_TREE: &str = "index:unique";

/// The main storage engine wrapping sled.
pub struct StorageEngine {
    /// The underlying sled database.
    db: Db,

    /// Tree for row data.
    data_tree: Tree,

    /// Tree for metadata.
    meta_tree: Tree,

    /// Tree for unique index entries.
    index_tree: Tree,
}

impl StorageEngine {
    /// Open or create a storage engine with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let sled_config = config.to_sled_config();
        let db = sled_config.open()?;
        let data_tree = db.open_tree(DATA_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;
        let index_tree = db.open_tree(UNIQUE_INDEX_TREE)?;

        Ok(Self {
            db,
            data_tree,
            meta_tree,
            index_tree,
        })
    }

    /// Check if the database was recovered from a previous run.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Get the committed record of a row.
    pub fn get(&self, entity: &str, id: u64) -> Result<Option<Record>, Error> {
        match self.data_tree.get(RowKey::new(entity, id).encode())? {
            Some(bytes) => Ok(Some(Record::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Check whether a committed row exists.
    pub fn contains(&self, entity: &str, id: u64) -> Result<bool, Error> {
        Ok(self
            .data_tree
            .contains_key(RowKey::new(entity, id).encode())?)
    }

    /// Scan all committed rows of an entity in id order.
    pub fn scan(&self, entity: &str) -> impl Iterator<Item = Result<(u64, Record), Error>> + '_ {
        let entity = entity.to_string();
        self.data_tree
            .scan_prefix(entity_prefix(&entity))
            .map(move |result| {
                let (key_bytes, value_bytes) = result?;
                let id = RowKey::decode_id(&entity, &key_bytes).ok_or_else(|| {
                    Error::InvalidData(format!("malformed row key in {entity}"))
                })?;
                Ok((id, Record::from_bytes(&value_bytes)?))
            })
    }

    /// Count committed rows of an entity.
    pub fn count(&self, entity: &str) -> Result<usize, Error> {
        let mut count = 0;
        for result in self.data_tree.scan_prefix(entity_prefix(entity)).keys() {
            result?;
            count += 1;
        }
        Ok(count)
    }

    /// Last id handed out for an entity (0 when none).
    pub fn sequence(&self, entity: &str) -> Result<u64, Error> {
        match self.meta_tree.get(sequence_key(entity))? {
            Some(bytes) => {
                let buf: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    Error::InvalidData(format!("malformed sequence for {entity}"))
                })?;
                Ok(u64::from_be_bytes(buf))
            }
            None => Ok(0),
        }
    }

    /// Look up a committed unique index entry.
    pub fn index_get(&self, key: &[u8]) -> Result<Option<u64>, Error> {
        match self.index_tree.get(key)? {
            Some(bytes) => {
                let buf: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| Error::InvalidData("malformed unique index entry".into()))?;
                Ok(Some(u64::from_be_bytes(buf)))
            }
            None => Ok(None),
        }
    }

    /// List committed unique index keys with the given prefix.
    pub fn index_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
        let mut keys = Vec::new();
        for result in self.index_tree.scan_prefix(prefix).keys() {
            keys.push(result?.to_vec());
        }
        Ok(keys)
    }

    /// Start a new transaction.
    pub fn transaction(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Get the underlying database, for opening auxiliary trees.
    pub fn db(&self) -> &Db {
        &self.db
    }

    pub(crate) fn data_tree(&self) -> &Tree {
        &self.data_tree
    }

    pub(crate) fn meta_tree(&self) -> &Tree {
        &self.meta_tree
    }

    pub(crate) fn index_tree(&self) -> &Tree {
        &self.index_tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine() -> StorageEngine {
        StorageEngine::open(StorageConfig::temporary()).unwrap()
    }

    #[test]
    fn test_put_get_scan() {
        let engine = test_engine();
        let mut tx = engine.transaction();
        tx.put("courses", 2, Record::new(b"b".to_vec()));
        tx.put("courses", 1, Record::new(b"a".to_vec()));
        tx.put("students", 1, Record::new(b"s".to_vec()));
        tx.commit().unwrap();

        assert_eq!(engine.get("courses", 1).unwrap().unwrap().data, b"a");
        assert!(engine.get("courses", 3).unwrap().is_none());
        assert!(engine.contains("students", 1).unwrap());

        let ids: Vec<u64> = engine
            .scan("courses")
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(engine.count("courses").unwrap(), 2);
        assert_eq!(engine.count("enrollments").unwrap(), 0);
    }

    #[test]
    fn test_sequence_defaults_to_zero() {
        let engine = test_engine();
        assert_eq!(engine.sequence("departments").unwrap(), 0);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let engine = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
            let mut tx = engine.transaction();
            let id = tx.next_id("departments").unwrap();
            tx.put("departments", id, Record::new(b"cs".to_vec()));
            tx.commit().unwrap();
            engine.flush().unwrap();
        }

        let engine = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
        assert_eq!(engine.sequence("departments").unwrap(), 1);
        assert_eq!(engine.get("departments", 1).unwrap().unwrap().data, b"cs");
    }
}
