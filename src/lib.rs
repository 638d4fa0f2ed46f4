//! State Migrator Library
//!
//! Paginated backup/restore pipeline for remote stateful services:
//! datasets ("jobs") are extracted in bounded-size chunks to durable local
//! storage and later replayed, in order, into a live service instance.

pub mod backup;
pub mod client;
pub mod config;
pub mod jobs;
pub mod range;
pub mod report;
pub mod restore;
pub mod store;
pub mod transform;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::MigrationError;
pub type Result<T> = std::result::Result<T, MigrationError>;
