//! Evaluation of check constraint predicates against rows.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::CheckExpr;
use crate::value::{Row, Value};

/// Errors that can occur while evaluating a predicate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// The field holds a value the predicate cannot compare.
    #[error("type mismatch on {field}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Expected kind of value.
        expected: &'static str,
        /// Actual value type.
        found: &'static str,
    },
    /// A range bound has no exact decimal form.
    #[error("invalid bound {bound} on {field}")]
    InvalidBound {
        /// Field name.
        field: String,
        /// Offending bound.
        bound: f64,
    },
}

/// Evaluates [`CheckExpr`] predicates.
pub struct CheckEvaluator;

impl CheckEvaluator {
    /// Evaluate a predicate. NULL and absent values satisfy every check.
    pub fn evaluate(check: &CheckExpr, row: &Row) -> Result<bool, EvaluationError> {
        let value = match row.get(check.field()) {
            None | Some(Value::Null) => return Ok(true),
            Some(v) => v,
        };

        match check {
            CheckExpr::Range { field, min, max } => {
                let n = match value {
                    Value::Int(i) => Decimal::from(*i),
                    Value::Decimal(d) => *d,
                    other => {
                        return Err(EvaluationError::TypeMismatch {
                            field: field.clone(),
                            expected: "number",
                            found: other.type_name(),
                        })
                    }
                };
                let min = bound(field, *min)?;
                let max = max.map(|m| bound(field, m)).transpose()?;
                Ok(n >= min && max.map_or(true, |m| n <= m))
            }
            CheckExpr::OneOf { field, values } => match value {
                Value::Text(s) => Ok(values.iter().any(|v| v == s)),
                other => Err(EvaluationError::TypeMismatch {
                    field: field.clone(),
                    expected: "text",
                    found: other.type_name(),
                }),
            },
        }
    }
}

/// Range bounds compare as exact decimals.
fn bound(field: &str, value: f64) -> Result<Decimal, EvaluationError> {
    Decimal::try_from(value).map_err(|_| EvaluationError::InvalidBound {
        field: field.to_string(),
        bound: value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn gpa_range() -> CheckExpr {
        CheckExpr::Range {
            field: "gpa".into(),
            min: 0.0,
            max: Some(5.0),
        }
    }

    #[test]
    fn test_range() {
        let check = gpa_range();
        let ok = Row::new().with("gpa", Decimal::new(450, 2));
        let edge = Row::new().with("gpa", Decimal::new(500, 2));
        let high = Row::new().with("gpa", Decimal::new(510, 2));
        let negative = Row::new().with("gpa", -1);

        assert!(CheckEvaluator::evaluate(&check, &ok).unwrap());
        assert!(CheckEvaluator::evaluate(&check, &edge).unwrap());
        assert!(!CheckEvaluator::evaluate(&check, &high).unwrap());
        assert!(!CheckEvaluator::evaluate(&check, &negative).unwrap());
    }

    #[test]
    fn test_range_compares_exact_decimals() {
        let check = gpa_range();
        let above = Decimal::from_str("5.0000000000000000000000001").unwrap();
        let below = Decimal::from_str("-0.0000000000000000000000001").unwrap();

        assert!(!CheckEvaluator::evaluate(&check, &Row::new().with("gpa", above)).unwrap());
        assert!(!CheckEvaluator::evaluate(&check, &Row::new().with("gpa", below)).unwrap());
    }

    #[test]
    fn test_non_finite_bound() {
        let check = CheckExpr::Range {
            field: "gpa".into(),
            min: f64::NAN,
            max: None,
        };
        let err = CheckEvaluator::evaluate(&check, &Row::new().with("gpa", 1)).unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidBound { .. }));
    }

    #[test]
    fn test_open_range() {
        let check = CheckExpr::Range {
            field: "budget".into(),
            min: 0.0,
            max: None,
        };
        let row = Row::new().with("budget", Decimal::new(50000000, 2));
        assert!(CheckEvaluator::evaluate(&check, &row).unwrap());
    }

    #[test]
    fn test_null_passes() {
        let row = Row::new().with("gpa", Value::Null);
        assert!(CheckEvaluator::evaluate(&gpa_range(), &row).unwrap());
        assert!(CheckEvaluator::evaluate(&gpa_range(), &Row::new()).unwrap());
    }

    #[test]
    fn test_one_of() {
        let check = CheckExpr::OneOf {
            field: "grade".into(),
            values: vec!["5".into(), "A".into(), "MA".into()],
        };

        assert!(CheckEvaluator::evaluate(&check, &Row::new().with("grade", "MA")).unwrap());
        assert!(!CheckEvaluator::evaluate(&check, &Row::new().with("grade", "B")).unwrap());
    }

    #[test]
    fn test_type_mismatch() {
        let row = Row::new().with("gpa", "high");
        let err = CheckEvaluator::evaluate(&gpa_range(), &row).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::TypeMismatch {
                field: "gpa".into(),
                expected: "number",
                found: "text",
            }
        );
    }
}
