//! Dynamic field values and rows.
//!
//! Rows are the unit the constraint engine works on. Typed records in
//! [`crate::model`] convert to and from rows at the repository boundary.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Integer value (identities, foreign keys, counts, years).
    Int(i64),
    /// Fixed-point decimal.
    Decimal(Decimal),
    /// UTF-8 text.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
        }
    }

    /// Interpret the value as a row identity.
    pub fn as_id(&self) -> Option<u64> {
        match self {
            Value::Int(i) if *i > 0 => Some(*i as u64),
            _ => None,
        }
    }

    /// Canonical text used when building unique index keys.
    ///
    /// Returns `None` for NULL, which never participates in uniqueness.
    pub fn index_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(i.to_string()),
            Value::Decimal(d) => Some(d.normalize().to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Date(d) => Some(d.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{d}"),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

/// Ids beyond `i64::MAX` become text, which no integer column accepts.
impl From<u64> for Value {
    fn from(i: u64) -> Self {
        i64::try_from(i).map_or_else(|_| Value::Text(i.to_string()), Value::Int)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// A row: field name to value, without the identity of auto-increment tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Check if the field is present (even as NULL).
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `changes` onto this row.
    pub fn merge(&mut self, changes: Row) {
        self.0.extend(changes.0);
    }

    /// Encode the row as JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode a row from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }

    fn value(&self, field: &str) -> &Value {
        self.0.get(field).unwrap_or(&Value::Null)
    }

    fn mismatch(field: &str, expected: &str, found: &Value) -> Error {
        Error::InvalidData(format!(
            "field {field}: expected {expected}, found {}",
            found.type_name()
        ))
    }

    fn missing(field: &str) -> Error {
        Error::InvalidData(format!("field {field}: unexpected null"))
    }

    /// Read a nullable integer field.
    pub fn opt_int(&self, field: &str) -> Result<Option<i64>, Error> {
        match self.value(field) {
            Value::Null => Ok(None),
            Value::Int(i) => Ok(Some(*i)),
            other => Err(Self::mismatch(field, "int", other)),
        }
    }

    /// Read a required integer field.
    pub fn int(&self, field: &str) -> Result<i64, Error> {
        self.opt_int(field)?.ok_or_else(|| Self::missing(field))
    }

    /// Read a nullable identity reference.
    pub fn opt_id(&self, field: &str) -> Result<Option<u64>, Error> {
        match self.opt_int(field)? {
            None => Ok(None),
            Some(i) if i > 0 => Ok(Some(i as u64)),
            Some(i) => Err(Error::InvalidData(format!(
                "field {field}: {i} is not a valid identity"
            ))),
        }
    }

    /// Read a required identity reference.
    pub fn id(&self, field: &str) -> Result<u64, Error> {
        self.opt_id(field)?.ok_or_else(|| Self::missing(field))
    }

    /// Read a nullable decimal field.
    pub fn opt_decimal(&self, field: &str) -> Result<Option<Decimal>, Error> {
        match self.value(field) {
            Value::Null => Ok(None),
            Value::Decimal(d) => Ok(Some(*d)),
            Value::Int(i) => Ok(Some(Decimal::from(*i))),
            other => Err(Self::mismatch(field, "decimal", other)),
        }
    }

    /// Read a nullable text field.
    pub fn opt_text(&self, field: &str) -> Result<Option<String>, Error> {
        match self.value(field) {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            other => Err(Self::mismatch(field, "text", other)),
        }
    }

    /// Read a required text field.
    pub fn text(&self, field: &str) -> Result<String, Error> {
        self.opt_text(field)?.ok_or_else(|| Self::missing(field))
    }

    /// Read a nullable date field.
    pub fn opt_date(&self, field: &str) -> Result<Option<NaiveDate>, Error> {
        match self.value(field) {
            Value::Null => Ok(None),
            Value::Date(d) => Ok(Some(*d)),
            other => Err(Self::mismatch(field, "date", other)),
        }
    }

    /// Read a required date field.
    pub fn date(&self, field: &str) -> Result<NaiveDate, Error> {
        self.opt_date(field)?.ok_or_else(|| Self::missing(field))
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accessors() {
        let row = Row::new()
            .with("course_code", "CS101")
            .with("credits", 3)
            .with("instructor_id", Option::<i64>::None)
            .with("budget", Decimal::new(50000000, 2));

        assert_eq!(row.text("course_code").unwrap(), "CS101");
        assert_eq!(row.int("credits").unwrap(), 3);
        assert_eq!(row.opt_id("instructor_id").unwrap(), None);
        assert_eq!(row.opt_decimal("budget").unwrap(), Some(Decimal::new(500000, 0)));
        assert!(row.contains("instructor_id"));
        assert!(!row.contains("room_number"));
    }

    #[test]
    fn test_type_mismatch() {
        let row = Row::new().with("credits", "three");
        let err = row.int("credits").unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_required_field_null() {
        let row = Row::new().with("email", Value::Null);
        assert!(row.text("email").is_err());
        assert!(row.date("start_date").is_err());
    }

    #[test]
    fn test_index_text() {
        assert_eq!(Value::Null.index_text(), None);
        assert_eq!(Value::Int(42).index_text().as_deref(), Some("42"));
        assert_eq!(
            Value::Decimal(Decimal::new(420, 2)).index_text().as_deref(),
            Some("4.2")
        );
    }

    #[test]
    fn test_ids_beyond_i64_are_not_ids() {
        assert_eq!(Value::from(7u64), Value::Int(7));
        assert_eq!(Value::from(i64::MAX as u64).as_id(), Some(i64::MAX as u64));

        let huge = Value::from(u64::MAX);
        assert_eq!(huge, Value::Text(u64::MAX.to_string()));
        assert_eq!(huge.as_id(), None);
    }

    #[test]
    fn test_json_encoding_keeps_types() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let row = Row::new()
            .with("enrollment_date", date)
            .with("grade", Value::Null)
            .with("gpa", Decimal::new(420, 2));

        let decoded = Row::from_bytes(&row.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, row);
        assert_eq!(decoded.date("enrollment_date").unwrap(), date);
    }

    #[test]
    fn test_merge_overrides() {
        let mut row = Row::new().with("status", "Active").with("grade", Value::Null);
        row.merge(Row::new().with("grade", "5"));

        assert_eq!(row.text("status").unwrap(), "Active");
        assert_eq!(row.opt_text("grade").unwrap().as_deref(), Some("5"));
    }
}
