//! Key encoding for rows and sequences.

use std::fmt;

/// Size of a row id in bytes.
pub const ROW_ID_SIZE: usize = 8;

/// Prefix for per-entity id sequences in the meta tree.
const SEQUENCE_PREFIX: &[u8] = b"seq:";

/// Key of a row in the data tree.
///
/// Key format: `[entity name][0x00][id (8 bytes, big-endian)]`
///
/// Big-endian ids keep a prefix scan over one entity in id order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowKey<'a> {
    /// Entity (table) name.
    pub entity: &'a str,
    /// Row identity.
    pub id: u64,
}

impl<'a> RowKey<'a> {
    /// Create a new row key.
    pub fn new(entity: &'a str, id: u64) -> Self {
        Self { entity, id }
    }

    /// Encode the key to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = entity_prefix(self.entity);
        buf.extend_from_slice(&self.id.to_be_bytes());
        buf
    }

    /// Decode the id from an encoded key belonging to `entity`.
    pub fn decode_id(entity: &str, bytes: &[u8]) -> Option<u64> {
        let rest = bytes.strip_prefix(entity.as_bytes())?.strip_prefix(&[0u8])?;
        let buf: [u8; ROW_ID_SIZE] = rest.try_into().ok()?;
        Some(u64::from_be_bytes(buf))
    }
}

impl fmt::Debug for RowKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity, self.id)
    }
}

/// Prefix shared by every key of one entity.
pub fn entity_prefix(entity: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(entity.len() + 1 + ROW_ID_SIZE);
    buf.extend_from_slice(entity.as_bytes());
    buf.push(0);
    buf
}

/// Key holding the last assigned id of an entity.
pub fn sequence_key(entity: &str) -> Vec<u8> {
    let mut buf = SEQUENCE_PREFIX.to_vec();
    buf.extend_from_slice(entity.as_bytes());
    buf
}

/// Get current timestamp in microseconds since Unix epoch.
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let key = RowKey::new("students", 42);
        let encoded = key.encode();

        assert_eq!(RowKey::decode_id("students", &encoded), Some(42));
        assert_eq!(RowKey::decode_id("courses", &encoded), None);
        assert!(encoded.starts_with(&entity_prefix("students")));
    }

    #[test]
    fn test_lexicographic_ordering() {
        let enc1 = RowKey::new("courses", 2).encode();
        let enc2 = RowKey::new("courses", 10).encode();
        let enc3 = RowKey::new("courses", 300).encode();

        assert!(enc1 < enc2);
        assert!(enc2 < enc3);
    }

    #[test]
    fn test_prefix_does_not_overlap() {
        // "course" must not match keys of "courses"
        let key = RowKey::new("courses", 1).encode();
        assert!(!key.starts_with(&entity_prefix("course")));
    }

    #[test]
    fn test_decode_invalid_length() {
        let mut bad = entity_prefix("students");
        bad.extend_from_slice(&[0u8; 3]);
        assert!(RowKey::decode_id("students", &bad).is_none());
    }
}
