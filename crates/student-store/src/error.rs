//! Storage errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The email is already present in the table.
    #[error("Email already registered: {0}")]
    DuplicateKey(String),

    #[error("Storage error: {0}")]
    Internal(#[from] rusqlite::Error),
}
