//! Scoped connection acquisition.
//!
//! # Responsibility
//! - Yield ready (configured + migrated) connections on demand.
//! - Guarantee the connection is closed on every exit path of an operation.
//!
//! # Invariants
//! - Providers never cache or share a connection between acquisitions.

use super::open::open_db;
use super::{DbError, DbResult};
use log::warn;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Source of ready-to-use SQLite connections.
pub trait ConnectionProvider {
    /// Opens a new, fully migrated connection.
    fn acquire(&self) -> DbResult<Connection>;

    /// Runs `op` with a freshly acquired connection and closes it afterwards.
    ///
    /// The connection is released whether `op` succeeds or fails. A failed
    /// close after a successful `op` is surfaced as an error.
    fn with_connection<T, E, F>(&self, op: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&mut Connection) -> Result<T, E>,
    {
        let mut conn = self.acquire()?;
        let outcome = op(&mut conn);
        match (outcome, conn.close()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err((_conn, err))) => Err(DbError::from(err).into()),
            (Err(err), close_result) => {
                if let Err((_conn, close_err)) = close_result {
                    warn!(
                        "event=db_close module=db status=error error_code=db_close_failed error={}",
                        close_err
                    );
                }
                Err(err)
            }
        }
    }
}

/// Provider that opens the same database file on every acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConnectionProvider {
    path: PathBuf,
}

impl FileConnectionProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectionProvider for FileConnectionProvider {
    fn acquire(&self) -> DbResult<Connection> {
        open_db(&self.path)
    }
}
