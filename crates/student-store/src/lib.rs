//! SQLite storage for student registrations.
//!
//! A single `students` table holds every registration. The store never keeps
//! a connection open between calls: each operation opens its own connection
//! and releases it before returning, so many callers can share one database
//! file without sharing a handle.

mod error;
mod store;
mod types;

pub use error::StoreError;
pub use store::StudentStore;
pub use types::*;
