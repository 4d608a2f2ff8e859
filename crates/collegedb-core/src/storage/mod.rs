//! Storage layer for the college store.
//!
//! This module provides a sled-based storage engine with atomic multi-tree transactions.

mod config;
mod engine;
mod record;
mod transaction;

pub mod key;

pub use config::StorageConfig;
pub use engine::{StorageEngine, UNIQUE_INDEX_TREE};
pub use key::RowKey;
pub use record::Record;
pub use transaction::Transaction;
