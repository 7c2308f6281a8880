use thiserror::Error;

use crate::core::config::ConfigError;

/// Centralized error types for the application
///
/// Boundary-specific failures (webhook rejections, reseller outages, admin
/// notification failures) have their own enums next to the code that
/// handles them. Everything that can bubble up from storage, the Telegram
/// client, or startup ends up here.
///
/// # Example
///
/// ```no_run
/// use mlbb_topup_bot::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] refinery::Error),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
