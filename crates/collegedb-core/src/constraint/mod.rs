//! Constraint enforcement module.
//!
//! This module provides constraint validation and enforcement:
//! - Unique constraints (single and composite)
//! - Foreign key existence checks
//! - Check constraints (range and vocabulary predicates)

mod check;
mod unique_index;
mod validator;

pub use check::{CheckEvaluator, EvaluationError};
pub use unique_index::UniqueIndex;
pub use validator::ConstraintValidator;
