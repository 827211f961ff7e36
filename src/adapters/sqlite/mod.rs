//! SQLite adapter: Implementation of TestRecords.
//!
//! Provides local persistence for blood test records. Timestamps are stored
//! as RFC 3339 text so ordering by `created_at` is lexicographic.
//!
//! # Mutex Behavior
//!
//! The connection is protected by `Mutex`. A poisoned mutex (from a panic in
//! another thread) causes a panic here rather than reading half-written state.
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{BloodTest, TestStatus};
use crate::ports::TestRecords;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Cannot store record {id}: {reason}")]
    Unstorable { id: String, reason: String },
}

const SELECT_COLUMNS: &str = r"
    SELECT id, user_id, file_name, file_path, file_type, file_size,
           created_at, processed
    FROM blood_tests
";

/// SQLite record store.
pub struct SqliteTestStore {
    conn: Mutex<Connection>,
}

impl SqliteTestStore {
    /// Open (or create) a store at the given database path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS blood_tests (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                file_name TEXT NOT NULL,
                file_path TEXT NOT NULL,
                file_type TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                processed INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_blood_tests_created
                ON blood_tests(created_at DESC);
            ",
        )?;

        Ok(())
    }

    /// Raw columns of one row; timestamp parsing happens outside rusqlite's
    /// closure so a bad value maps to `StorageError::Corrupt`.
    fn read_row(row: &Row<'_>) -> rusqlite::Result<RawTest> {
        Ok(RawTest {
            id: row.get(0)?,
            user_id: row.get(1)?,
            file_name: row.get(2)?,
            file_path: row.get(3)?,
            file_type: row.get(4)?,
            file_size: row.get(5)?,
            created_at: row.get(6)?,
            processed: row.get(7)?,
        })
    }
}

struct RawTest {
    id: String,
    user_id: String,
    file_name: String,
    file_path: String,
    file_type: String,
    file_size: i64,
    created_at: String,
    processed: i64,
}

impl RawTest {
    fn parse_created_at(
        id: &str,
        raw: &str,
    ) -> Result<chrono::DateTime<chrono::Utc>, StorageError> {
        chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .map_err(|e| StorageError::Corrupt {
                id: id.to_string(),
                reason: format!("bad created_at '{raw}': {e}"),
            })
    }

    fn into_test(self) -> Result<BloodTest, StorageError> {
        let created_at = Self::parse_created_at(&self.id, &self.created_at)?;
        let file_size = u64::try_from(self.file_size).map_err(|_| StorageError::Corrupt {
            id: self.id.clone(),
            reason: format!("negative file_size {}", self.file_size),
        })?;

        Ok(BloodTest {
            id: self.id,
            user_id: self.user_id,
            file_name: self.file_name,
            file_path: self.file_path,
            file_type: self.file_type,
            file_size,
            created_at,
            processed: self.processed != 0,
        })
    }
}

impl TestRecords for SqliteTestStore {
    type Error = StorageError;

    fn save_test(&self, test: &BloodTest) -> Result<(), Self::Error> {
        let file_size = i64::try_from(test.file_size).map_err(|_| StorageError::Unstorable {
            id: test.id.clone(),
            reason: format!("file_size {} exceeds {}", test.file_size, i64::MAX),
        })?;

        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            r"
            INSERT INTO blood_tests (
                id, user_id, file_name, file_path, file_type, file_size,
                created_at, processed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                test.id,
                test.user_id,
                test.file_name,
                test.file_path,
                test.file_type,
                file_size,
                test.created_at.to_rfc3339(),
                i64::from(test.processed),
            ],
        )?;

        tracing::debug!("Saved blood test {} to storage", test.id);
        Ok(())
    }

    fn load_test(&self, id: &str) -> Result<Option<BloodTest>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let raw = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                Self::read_row,
            )
            .optional()?;

        raw.map(RawTest::into_test).transpose()
    }

    fn test_status(&self, id: &str) -> Result<Option<TestStatus>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let row = conn
            .query_row(
                "SELECT processed, created_at FROM blood_tests WHERE id = ?1",
                params![id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match row {
            Some((processed, created_at)) => Ok(Some(TestStatus {
                processed: processed != 0,
                created_at: RawTest::parse_created_at(id, &created_at)?,
            })),
            None => Ok(None),
        }
    }

    fn load_tests(&self) -> Result<Vec<BloodTest>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC"))?;
        let raws = stmt
            .query_map([], Self::read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raws.into_iter().map(RawTest::into_test).collect()
    }

    fn mark_processed(&self, id: &str) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let updated = conn.execute(
            "UPDATE blood_tests SET processed = 1 WHERE id = ?1",
            params![id],
        )?;
        if updated == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }

        tracing::info!("Marked blood test {} as processed", id);
        Ok(())
    }

    fn delete_test(&self, id: &str) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute("DELETE FROM blood_tests WHERE id = ?1", params![id])?;
        tracing::info!("Deleted blood test {}", id);
        Ok(())
    }

    fn count_tests(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM blood_tests", [], |row| row.get(0))?;

        Ok(count as usize)
    }
}
