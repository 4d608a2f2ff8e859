//! CLI error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// The store rejected or failed an operation.
    #[error(transparent)]
    Store(#[from] collegedb_core::Error),

    /// A requested row does not exist.
    #[error("{table} row {id} not found")]
    RowNotFound { table: String, id: u64 },
}
