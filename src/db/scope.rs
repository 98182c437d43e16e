//! Request-scoped connection ownership.

use crate::{Error, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Owns at most one database connection for the lifetime of one request.
///
/// The connection opens lazily on the first [`acquire`](Self::acquire) and
/// closes on [`release`](Self::release). Release is idempotent and runs
/// again on drop, so the connection cannot outlive the scope no matter
/// which path a request handler takes. Acquiring after a release opens a
/// fresh connection.
///
/// No other component may hold the connection reference past the scope's
/// release; the executors borrow it for the span of one call and hand it
/// back.
#[derive(Debug)]
pub struct ConnectionScope {
    path: PathBuf,
    conn: Option<Connection>,
}

impl ConnectionScope {
    /// Creates a scope for the database at `path` without opening it.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    /// The database path this scope opens.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a live connection is currently held.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Returns the scope's connection, opening and configuring it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the database cannot be opened.
    pub fn acquire(&mut self) -> Result<&Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.open()?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Closes the underlying connection if one was opened.
    ///
    /// Safe to call any number of times. A close failure is logged and
    /// swallowed; the handle is gone either way.
    pub fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!(error = %e, "Failed to close scoped connection");
                metrics::counter!("agora_connection_close_failures_total").increment(1);
            }
        }
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(|e| Error::OperationFailed {
            operation: "open_connection".to_string(),
            cause: format!("{}: {e}", self.path.display()),
        })?;
        configure_connection(&conn)?;
        tracing::debug!(path = %self.path.display(), "Opened request-scoped connection");
        metrics::counter!("agora_connections_opened_total").increment(1);
        Ok(conn)
    }
}

impl Drop for ConnectionScope {
    fn drop(&mut self) {
        self.release();
    }
}

/// Configures a connection for concurrent request traffic.
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **NORMAL synchronous**: balances durability with performance
/// - **`busy_timeout`**: waits up to 5 seconds for locks instead of failing
fn configure_connection(conn: &Connection) -> Result<()> {
    // pragma_update returns the pragma's result row, which we ignore -
    // journal_mode answers with a string like "wal"
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scope_in(dir: &TempDir) -> ConnectionScope {
        ConnectionScope::new(dir.path().join("scope.db"))
    }

    #[test]
    fn test_acquire_is_lazy() {
        let dir = TempDir::new().unwrap();
        let scope = scope_in(&dir);
        assert!(!scope.is_open());
        assert!(!scope.path().exists());
    }

    #[test]
    fn test_acquire_opens_once() {
        let dir = TempDir::new().unwrap();
        let mut scope = scope_in(&dir);

        scope.acquire().unwrap();
        assert!(scope.is_open());
        // Second acquire reuses the held connection
        scope.acquire().unwrap();
        assert!(scope.is_open());
    }

    #[test]
    fn test_release_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut scope = scope_in(&dir);

        scope.acquire().unwrap();
        scope.release();
        assert!(!scope.is_open());
        scope.release();
        assert!(!scope.is_open());
    }

    #[test]
    fn test_acquire_after_release_reopens() {
        let dir = TempDir::new().unwrap();
        let mut scope = scope_in(&dir);

        let conn = scope.acquire().unwrap();
        conn.execute_batch("CREATE TABLE marker (id INTEGER)").unwrap();
        scope.release();

        // Fresh connection against the same file still sees the table
        let conn = scope.acquire().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE name = 'marker'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_configured_pragmas() {
        let dir = TempDir::new().unwrap();
        let mut scope = scope_in(&dir);
        let conn = scope.acquire().unwrap();

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");

        let busy_timeout: i32 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(busy_timeout, 5000);
    }
}
