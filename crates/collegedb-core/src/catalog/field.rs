//! Field definitions for entities.

use super::types::ScalarType;
use crate::value::Value;
use rkyv::{Archive, Deserialize, Serialize};

/// A field definition within an entity.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Column type.
    pub scalar: ScalarType,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Default value applied when the field is omitted on insert.
    pub default: Option<DefaultValue>,
}

/// Default value for a field.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum DefaultValue {
    /// Integer value.
    Int(i64),
    /// String value.
    Text(String),
}

impl DefaultValue {
    /// Materialize the default as a row value.
    pub fn to_value(&self) -> Value {
        match self {
            DefaultValue::Int(i) => Value::Int(*i),
            DefaultValue::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl FieldDef {
    /// Create a new required (non-nullable) field.
    pub fn new(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
            nullable: false,
            default: None,
        }
    }

    /// Create a nullable field.
    pub fn optional(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
            nullable: true,
            default: None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Check if this field has a default value.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_def_builder() {
        let field = FieldDef::new("credits", ScalarType::Int32).with_default(DefaultValue::Int(3));

        assert_eq!(field.name, "credits");
        assert!(!field.nullable);
        assert!(field.has_default());
        assert_eq!(field.default.unwrap().to_value(), Value::Int(3));
    }

    #[test]
    fn test_optional_field() {
        let field = FieldDef::optional("building", ScalarType::String { max_len: 100 });

        assert!(field.nullable);
        assert!(!field.has_default());
    }
}
