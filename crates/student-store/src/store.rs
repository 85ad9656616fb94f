//! Connection-per-operation SQLite store.

use crate::error::StoreError;
use crate::types::{NewStudent, StudentRecord};
use chrono::NaiveDateTime;
use rusqlite::{ffi, params, Connection, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default time a connection waits on a locked database.
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS students (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone TEXT NOT NULL,
        course TEXT NOT NULL,
        registration_date TIMESTAMP NOT NULL
            DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    )";

const INSERT_SQL: &str = "
    INSERT INTO students (first_name, last_name, email, phone, course)
    VALUES (?1, ?2, ?3, ?4, ?5)";

const SELECT_ALL_SQL: &str = "
    SELECT id, first_name, last_name, email, phone, course, registration_date
    FROM students
    ORDER BY registration_date DESC, id DESC";

/// Handle to the registration database.
///
/// Holds only the location of the database file. Every operation opens a
/// fresh connection and drops it before returning, including on error.
#[derive(Debug, Clone)]
pub struct StudentStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl StudentStore {
    /// Create a store backed by the SQLite file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Set how long a connection waits for a concurrent writer.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Create the `students` table if it does not exist yet.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute_batch(CREATE_TABLE_SQL)?;
        info!("Student table ready");
        Ok(())
    }

    /// Insert a registration and return its identifier.
    ///
    /// Fails with [`StoreError::DuplicateKey`] when the email is taken.
    #[instrument(skip(self, student), fields(email = %student.email))]
    pub fn insert(&self, student: &NewStudent) -> Result<i64, StoreError> {
        let conn = self.connect()?;

        let result = conn.execute(
            INSERT_SQL,
            params![
                student.first_name,
                student.last_name,
                student.email,
                student.phone,
                student.course,
            ],
        );

        match result {
            Ok(_) => {
                let id = conn.last_insert_rowid();
                debug!(id, "Registration stored");
                Ok(id)
            }
            Err(e) if is_unique_violation(&e) => {
                warn!("Rejected duplicate email");
                Err(StoreError::DuplicateKey(student.email.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All registrations, newest first.
    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(SELECT_ALL_SQL)?;

        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = records.len(), "Loaded registrations");
        Ok(records)
    }

    /// Number of stored registrations.
    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    let registered_at: NaiveDateTime = row.get(6)?;

    Ok(StudentRecord {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        course: row.get(5)?,
        registered_at: registered_at.and_utc(),
    })
}

fn is_unique_violation(error: &rusqlite::Error) -> bool {
    match error {
        rusqlite::Error::SqliteFailure(e, _) => e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, StudentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StudentStore::new(dir.path().join("students.db"));
        store.ensure_schema().unwrap();
        (dir, store)
    }

    fn student(email: &str) -> NewStudent {
        NewStudent {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            phone: "5551234567".into(),
            course: "Mathematics".into(),
        }
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let (_dir, store) = test_store();
        store.insert(&student("ada@example.com")).unwrap();

        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();

        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let (_dir, store) = test_store();

        let first = store.insert(&student("one@example.com")).unwrap();
        let second = store.insert(&student("two@example.com")).unwrap();
        let third = store.insert(&student("three@example.com")).unwrap();

        assert_eq!(second, first + 1);
        assert_eq!(third, second + 1);
    }

    #[test]
    fn test_insert_populates_timestamp() {
        let (_dir, store) = test_store();
        let before = chrono::Utc::now() - chrono::Duration::seconds(5);

        store.insert(&student("ada@example.com")).unwrap();

        let records = store.list_all().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].registered_at >= before);
        assert_eq!(records[0].email, "ada@example.com");
        assert_eq!(records[0].full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (_dir, store) = test_store();

        store.insert(&student("ada@example.com")).unwrap();
        let err = store.insert(&student("ada@example.com")).unwrap_err();

        assert!(matches!(err, StoreError::DuplicateKey(ref email) if email == "ada@example.com"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_list_all_empty() {
        let (_dir, store) = test_store();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_list_all_newest_first() {
        let (_dir, store) = test_store();

        store.insert(&student("t1@example.com")).unwrap();
        thread::sleep(Duration::from_millis(5));
        store.insert(&student("t2@example.com")).unwrap();
        thread::sleep(Duration::from_millis(5));
        store.insert(&student("t3@example.com")).unwrap();

        let emails: Vec<String> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.email)
            .collect();

        assert_eq!(emails, vec!["t3@example.com", "t2@example.com", "t1@example.com"]);
    }

    #[test]
    fn test_same_timestamp_ordered_by_id() {
        let (_dir, store) = test_store();
        let conn = Connection::open(store.path()).unwrap();
        for email in ["a@example.com", "b@example.com"] {
            conn.execute(
                "INSERT INTO students (first_name, last_name, email, phone, course, registration_date)
                 VALUES ('A', 'B', ?1, '5551234567', 'C', '2025-01-01 00:00:00.000')",
                params![email],
            )
            .unwrap();
        }

        let records = store.list_all().unwrap();
        assert_eq!(records[0].email, "b@example.com");
        assert_eq!(records[1].email, "a@example.com");
    }

    #[test]
    fn test_missing_directory_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = StudentStore::new(dir.path().join("missing").join("students.db"));

        let err = store.list_all().unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
    }

    #[test]
    fn test_concurrent_inserts_same_email() {
        let (_dir, store) = test_store();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || store.insert(&student("race@example.com")))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::DuplicateKey(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_record_serialization() {
        let (_dir, store) = test_store();
        store.insert(&student("ada@example.com")).unwrap();

        let record = store.list_all().unwrap().remove(0);
        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains("\"email\":\"ada@example.com\""));
        assert!(json.contains("\"registered_at\""));
    }
}
