//! Utility modules for the migration pipeline.

pub mod errors;
pub mod logger;

pub use errors::{MigrationError, Result};
