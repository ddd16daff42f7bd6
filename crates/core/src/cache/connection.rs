//! Database connection management with pragma configuration.
//!
//! Opening a store applies WAL pragmas, turns on foreign keys (entries
//! cascade-delete with their generation) and runs migrations.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Handle to the persistent cache storage.
///
/// Holds every cache generation. Cloning is cheap: all clones share the
/// tokio-rusqlite background thread.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open a store at the specified path, creating the file if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Flush and close the store.
    ///
    /// The connection is shared by every clone; calls through any clone
    /// fail with `CACHE_ERROR` afterwards.
    pub async fn close(self) -> Result<(), Error> {
        self.conn.close().await.map_err(Error::Database)
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}
