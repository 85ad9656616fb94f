//! API request and response types.

use serde::Serialize;
use std::collections::HashMap;
use student_store::NewStudent;

/// Collapse decoded key/value pairs, keeping the first value of each key.
pub(crate) fn first_values(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for (key, value) in pairs {
        fields.entry(key).or_insert(value);
    }
    fields
}

/// Registration form body.
///
/// Absent fields read as empty so that they fail the required-field check
/// rather than the extractor. A repeated field keeps its first value.
#[derive(Debug, Default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub course: String,
}

impl RegistrationForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut fields = first_values(pairs);
        let mut take = |key: &str| fields.remove(key).unwrap_or_default();

        Self {
            first_name: take("firstName"),
            last_name: take("lastName"),
            email: take("email"),
            phone: take("phone"),
            course: take("course"),
        }
    }

    /// Copy of the form with surrounding whitespace removed.
    pub fn trimmed(&self) -> NewStudent {
        NewStudent {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            course: self.course.trim().to_string(),
        }
    }
}

/// Query parameters of the confirmation page.
///
/// Each absent parameter reads as empty; a repeated one keeps its first value.
#[derive(Debug, Default)]
pub struct ConfirmationQuery {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub course: String,
}

impl ConfirmationQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut fields = first_values(pairs);
        let mut take = |key: &str| fields.remove(key).unwrap_or_default();

        Self {
            first_name: take("first_name"),
            last_name: take("last_name"),
            email: take("email"),
            course: take("course"),
        }
    }

    /// Build the confirmation URL for a stored registration.
    ///
    /// Values travel as plain query parameters, neither signed nor encrypted.
    pub fn url_for(student: &NewStudent) -> String {
        format!(
            "/confirmation?first_name={}&last_name={}&email={}&course={}",
            urlencoding::encode(&student.first_name),
            urlencoding::encode(&student.last_name),
            urlencoding::encode(&student.email),
            urlencoding::encode(&student.course),
        )
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_reachable: bool,
    pub registrations: usize,
}
