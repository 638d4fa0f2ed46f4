//! Custom error types for the migration pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Job enumeration failed: {0}")]
    Enumeration(String),

    #[error("Fetch failed for job '{job}' range [{start}, {end}): {reason}")]
    Fetch {
        job: String,
        start: u64,
        end: u64,
        reason: String,
    },

    #[error("Transform failed on field '{field}': {reason}")]
    Transform { field: String, reason: String },

    #[error("Submit rejected for job '{job}': {reason}")]
    Submit { job: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MigrationError>;
