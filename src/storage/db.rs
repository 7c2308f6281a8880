//! Record store for provider top-up callbacks
//!
//! One append-only table (`topups`). Rows are never updated or deleted; the
//! "first" top-up of a player is the row with the lowest id, so insertion
//! order wins over `created_at` if clocks disagree.

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use serde::Serialize;
use std::time::Duration;

use crate::core::error::AppResult;
use crate::storage::migrations::run_migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// A stored top-up event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopupRecord {
    /// Assigned by SQLite, strictly increasing
    pub id: i64,
    pub player_id: String,
    pub server_id: String,
    /// Provider-supplied transaction id (`txn_id` column)
    pub transaction_id: String,
    pub amount: String,
    pub provider: String,
    /// RFC 3339 UTC with millisecond precision, e.g. `2024-05-01T10:00:00.000Z`
    pub created_at: String,
}

/// A top-up about to be inserted.
///
/// `received_at` is stamped by this service when the callback arrives,
/// never taken from the provider payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopup {
    pub player_id: String,
    pub server_id: String,
    pub transaction_id: String,
    pub amount: String,
    pub provider: String,
    pub received_at: DateTime<Utc>,
}

impl NewTopup {
    pub fn new(
        player_id: impl Into<String>,
        server_id: impl Into<String>,
        transaction_id: impl Into<String>,
        amount: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            server_id: server_id.into(),
            transaction_id: transaction_id.into(),
            amount: amount.into(),
            provider: provider.into(),
            received_at: Utc::now(),
        }
    }

    /// Overrides the receive timestamp.
    pub fn received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    /// Timestamp in the format stored in `created_at`.
    pub fn created_at(&self) -> String {
        self.received_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Result of [`TopupStore::record_topup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new row was written with this id
    Inserted(i64),
    /// The (provider, transaction id) pair was already stored under this id
    Duplicate(i64),
}

/// Handle to the top-up table. Cheap to clone (shares the pool).
#[derive(Clone)]
pub struct TopupStore {
    pool: DbPool,
}

const SELECT_COLUMNS: &str = "SELECT id, player_id, server_id, txn_id, amount, provider, created_at FROM topups";

/// Create a new database connection pool
///
/// Every connection gets a busy timeout and WAL journaling so concurrent
/// webhook inserts and bot reads do not trip over each other.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Ok(())
    });
    let pool = Pool::builder().max_size(8).build(manager)?;
    Ok(pool)
}

impl TopupStore {
    /// Opens (creating if needed) the SQLite file and applies migrations.
    pub fn open(database_path: &str) -> AppResult<Self> {
        let store = Self::from_pool(create_pool(database_path)?)?;
        log::info!("Record store opened at {}", database_path);
        Ok(store)
    }

    /// Wraps an existing pool, applying migrations first.
    pub fn from_pool(pool: DbPool) -> AppResult<Self> {
        let mut conn = pool.get()?;
        run_migrations(&mut conn)?;
        Ok(Self { pool })
    }

    fn connection(&self) -> AppResult<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Appends a record and returns its id. No deduplication.
    pub fn insert(&self, topup: &NewTopup) -> AppResult<i64> {
        let conn = self.connection()?;
        insert_row(&conn, topup)
    }

    /// Inserts unless the same provider already reported this transaction id.
    ///
    /// Lookup and insert share one IMMEDIATE transaction, so two concurrent
    /// replays of the same callback cannot both insert.
    pub fn record_topup(&self, topup: &NewTopup) -> AppResult<RecordOutcome> {
        let mut conn = self.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM topups WHERE provider = ?1 AND txn_id = ?2 ORDER BY id ASC LIMIT 1",
                params![topup.provider, topup.transaction_id],
                |row| row.get(0),
            )
            .optional()?;

        let outcome = match existing {
            Some(id) => RecordOutcome::Duplicate(id),
            None => RecordOutcome::Inserted(insert_row(&tx, topup)?),
        };
        tx.commit()?;
        Ok(outcome)
    }

    /// Earliest (lowest id) record for the player/server pair.
    pub fn first_match(&self, player_id: &str, server_id: &str) -> AppResult<Option<TopupRecord>> {
        let conn = self.connection()?;
        let record = conn
            .query_row(
                &format!("{} WHERE player_id = ?1 AND server_id = ?2 ORDER BY id ASC LIMIT 1", SELECT_COLUMNS),
                params![player_id, server_id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Earliest record carrying this provider transaction id.
    pub fn find_by_transaction(&self, provider: &str, transaction_id: &str) -> AppResult<Option<TopupRecord>> {
        let conn = self.connection()?;
        let record = conn
            .query_row(
                &format!("{} WHERE provider = ?1 AND txn_id = ?2 ORDER BY id ASC LIMIT 1", SELECT_COLUMNS),
                params![provider, transaction_id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Total number of stored records.
    pub fn count(&self) -> AppResult<i64> {
        let conn = self.connection()?;
        let count = conn.query_row("SELECT COUNT(*) FROM topups", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn insert_row(conn: &rusqlite::Connection, topup: &NewTopup) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO topups (player_id, server_id, txn_id, amount, provider, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            topup.player_id,
            topup.server_id,
            topup.transaction_id,
            topup.amount,
            topup.provider,
            topup.created_at()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TopupRecord> {
    Ok(TopupRecord {
        id: row.get(0)?,
        player_id: row.get(1)?,
        server_id: row.get(2)?,
        transaction_id: row.get(3)?,
        amount: row.get(4)?,
        provider: row.get(5)?,
        created_at: row.get(6)?,
    })
}
