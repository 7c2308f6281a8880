//! MLBB top-up bot: a Telegram account checker with a provider webhook
//!
//! The bot answers `/cek`, `/bind` and `/firsttopup` from an optional
//! reseller API and a local SQLite record of provider top-up callbacks.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, and the HTTP server
//! - `storage`: SQLite record store and migrations
//! - `reseller`: Reseller API gateway with synthetic fallback
//! - `telegram`: Telegram bot integration and handlers
//! - `webhook`: Provider top-up callback endpoint

pub mod cli;
pub mod core;
pub mod reseller;
pub mod storage;
pub mod telegram;
pub mod webhook;

// Re-export commonly used types for convenience
pub use self::core::{config, AppError, AppResult, Config};
pub use reseller::{Account, BindStatus, ResellerGateway};
pub use storage::{create_pool, DbConnection, DbPool, NewTopup, RecordOutcome, TopupRecord, TopupStore};
