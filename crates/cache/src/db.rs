//! The catalog's SQLite file.
//!
//! A load is a single writer committing one small transaction per book,
//! back to back, while re-reading the same author and book indexes for every
//! chunk. The connection is configured for exactly that.

use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// KiB of page cache, as a negative `cache_size`. Sized for the `author`
/// and `book` indexes of a full catalog.
const CACHE_SIZE_KIB: i64 = 16 * 1024;

/// Handle on the catalog database; the schema is migrated on open.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating it, and its parent directory, if needed) the catalog
    /// at `path`.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
        }
        Self::open(Self::options().filename(path).create_if_missing(true)).await
    }

    /// Opens a private, empty catalog that disappears with the handle.
    ///
    /// Not `#[cfg(test)]`: the ingest crate's tests load into it.
    pub async fn connect_in_memory() -> Result<Self> {
        Self::open(Self::options().filename(":memory:")).await
    }

    async fn open(options: SqliteConnectOptions) -> Result<Self> {
        // Loading never has two statements in flight. One connection also
        // keeps an in-memory catalog a single database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    fn options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // Join rows must point at a stored book and author.
            .foreign_keys(true)
            // One commit per book: WAL appends, and NORMAL only syncs on
            // checkpoint. A crash can lose the last few books, which the next
            // incremental run stores again.
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("cache_size", format!("-{CACHE_SIZE_KIB}"))
    }

    #[instrument("migrating catalog schema", skip(self))]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Refreshes planner statistics for the tables the load just filled,
    /// then closes the connection.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
