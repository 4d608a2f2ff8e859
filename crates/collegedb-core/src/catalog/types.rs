//! Core type definitions for the catalog.

use rkyv::{Archive, Deserialize, Serialize};

use crate::value::Value;

/// Scalar column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum ScalarType {
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer (identities and foreign keys).
    Int64,
    /// Fixed-precision decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Number of digits after decimal point.
        scale: u8,
    },
    /// UTF-8 string with a maximum length in characters.
    String {
        /// Declared column width.
        max_len: u32,
    },
    /// Calendar date.
    Date,
}

impl ScalarType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int32 | ScalarType::Int64 | ScalarType::Decimal { .. }
        )
    }

    /// Check whether a value can be stored in a column of this type.
    ///
    /// NULL is accepted here; nullability is checked separately.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ScalarType::Int32, Value::Int(i)) => i32::try_from(*i).is_ok(),
            (ScalarType::Int64, Value::Int(_)) => true,
            (ScalarType::Decimal { .. }, Value::Decimal(_) | Value::Int(_)) => true,
            (ScalarType::String { .. }, Value::Text(_)) => true,
            (ScalarType::Date, Value::Date(_)) => true,
            _ => false,
        }
    }

    /// SQL-ish rendering used by schema listings.
    pub fn sql_name(&self) -> String {
        match self {
            ScalarType::Int32 => "INT".to_string(),
            ScalarType::Int64 => "BIGINT".to_string(),
            ScalarType::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
            ScalarType::String { max_len } => format!("VARCHAR({max_len})"),
            ScalarType::Date => "DATE".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_accepts() {
        assert!(ScalarType::Int64.accepts(&Value::Int(7)));
        assert!(ScalarType::Int32.accepts(&Value::Null));
        assert!(!ScalarType::Int32.accepts(&Value::Int(i64::MAX)));
        assert!(ScalarType::Decimal { precision: 3, scale: 2 }.accepts(&Value::Decimal(Decimal::new(450, 2))));
        assert!(!ScalarType::Date.accepts(&Value::Text("2024-09-01".into())));
    }

    #[test]
    fn test_sql_name() {
        assert_eq!(ScalarType::String { max_len: 20 }.sql_name(), "VARCHAR(20)");
        assert_eq!(
            ScalarType::Decimal { precision: 12, scale: 2 }.sql_name(),
            "DECIMAL(12,2)"
        );
        assert!(ScalarType::Int32.is_numeric());
        assert!(!ScalarType::Date.is_numeric());
    }
}
