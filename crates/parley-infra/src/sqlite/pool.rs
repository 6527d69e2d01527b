//! SQLite connection pools, split by access mode.
//!
//! SQLite permits a single writer at a time, so `DatabasePool` keeps a
//! one-connection writer pool (serializing all mutations) next to a wider
//! reader pool for concurrent SELECTs. WAL journal mode lets the readers
//! proceed while a write is in flight. Migrations run once on the writer
//! before the readers open.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

const READER_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Split read/write pool for SQLite with WAL mode.
#[derive(Clone)]
pub struct DatabasePool {
    /// Multi-connection pool for SELECT queries.
    pub reader: SqlitePool,
    /// Single-connection pool for INSERT/UPDATE/DELETE.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if missing) the database at `database_url` and run
    /// the embedded migrations.
    ///
    /// Both pools enforce foreign keys and share the busy timeout.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(opts.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }
}
