//! Registration record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields supplied when registering a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub course: String,
}

/// A stored registration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Auto-assigned, sequential identifier
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub course: String,
    /// Set by the store when the row is inserted
    pub registered_at: DateTime<Utc>,
}

impl StudentRecord {
    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
