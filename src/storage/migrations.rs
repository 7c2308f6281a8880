use rusqlite::Connection;
use std::sync::{Mutex, OnceLock};

use crate::core::error::AppResult;

mod embedded {
    use refinery::embed_migrations;

    embed_migrations!("./migrations");
}

static MIGRATION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Applies the embedded schema migrations.
///
/// Runs are serialized per-process; refinery wraps each migration in its own
/// transaction and skips the ones already recorded in its history table.
pub fn run_migrations(conn: &mut Connection) -> AppResult<()> {
    let mutex = MIGRATION_LOCK.get_or_init(|| Mutex::new(()));
    // Migrations are idempotent, so a lock poisoned by another thread is safe to reuse
    let _guard = match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Migration lock was poisoned, recovering...");
            poisoned.into_inner()
        }
    };

    let report = embedded::migrations::runner().run(conn)?;
    for migration in report.applied_migrations() {
        log::info!("Applied migration {}", migration);
    }
    Ok(())
}
