//! Ports layer: Trait definitions for external operations.
//!
//! These traits define the boundary between the report service and the
//! systems it reads from.

mod records;

pub use records::TestRecords;
