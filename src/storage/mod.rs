//! Durable storage for top-up records

pub mod db;
pub mod migrations;

// Re-exports for convenience
pub use db::{create_pool, DbConnection, DbPool, NewTopup, RecordOutcome, TopupRecord, TopupStore};
