//! Adapters layer: Concrete implementations of ports.
//!
//! - `sqlite`: SQLite record store
//! - `sanitize`: identifier and credential filtering for logs

pub mod sanitize;
pub mod sqlite;

pub use sqlite::{SqliteTestStore, StorageError};
