//! Record type for stored values.

use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// A stored row with write timestamps.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Record {
    /// Serialized row data.
    pub data: Vec<u8>,

    /// Creation timestamp in microseconds since Unix epoch.
    pub created_at: u64,

    /// Last update timestamp in microseconds since Unix epoch.
    pub updated_at: u64,
}

impl Record {
    /// Create a new record with the current timestamp.
    pub fn new(data: Vec<u8>) -> Self {
        let now = super::key::current_timestamp();
        Self {
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the data, keeping the creation time and bumping `updated_at`.
    pub fn updated(&self, data: Vec<u8>) -> Self {
        Self {
            data,
            created_at: self.created_at,
            updated_at: super::key::current_timestamp().max(self.updated_at),
        }
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        // sled values carry no alignment guarantee
        let mut aligned = rkyv::util::AlignedVec::<16>::new();
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let record = Record::new(vec![1, 2, 3, 4, 5]);
        let bytes = record.to_bytes().unwrap();
        let decoded = Record::from_bytes(&bytes).unwrap();

        assert_eq!(record, decoded);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_updated_keeps_created_at() {
        let record = Record {
            data: vec![1],
            created_at: 10,
            updated_at: 20,
        };
        let next = record.updated(vec![2]);

        assert_eq!(next.data, vec![2]);
        assert_eq!(next.created_at, 10);
        assert!(next.updated_at >= 20);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            Record::from_bytes(&[0xff, 0x01]),
            Err(Error::Deserialization(_))
        ));
    }
}
