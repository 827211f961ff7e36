//! Record port: Trait for blood test record persistence.
//!
//! This trait abstracts the record store (SQLite) from the report service.
//! The synthesis and scoring core never sees it.

use crate::domain::{BloodTest, TestStatus};

/// Trait for blood test record operations.
pub trait TestRecords: Send + Sync {
    /// Error type for record operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a new test record.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_test(&self, test: &BloodTest) -> Result<(), Self::Error>;

    /// Load a test record by ID.
    ///
    /// # Returns
    /// `None` if no such test exists.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_test(&self, id: &str) -> Result<Option<BloodTest>, Self::Error>;

    /// Look up whether a test is processed and when it was created.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn test_status(&self, id: &str) -> Result<Option<TestStatus>, Self::Error>;

    /// Load all tests, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_tests(&self) -> Result<Vec<BloodTest>, Self::Error>;

    /// Mark a test as processed.
    ///
    /// # Errors
    /// Returns error if the test does not exist or storage fails.
    fn mark_processed(&self, id: &str) -> Result<(), Self::Error>;

    /// Delete a test by ID.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn delete_test(&self, id: &str) -> Result<(), Self::Error>;

    /// Get the total count of tests.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_tests(&self) -> Result<usize, Self::Error>;
}
