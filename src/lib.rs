//! # Agora
//!
//! Community discussion HTTP services over a shared `SQLite` store.
//!
//! Four small services (users, posts, votes, messages) share one
//! request-scoped data-access layer: a lazily-opened connection bound to a
//! single request, a single-statement executor, an all-or-nothing
//! transactional executor, and a predicate builder for filtered list
//! queries. The HTTP layer validates input and maps outcomes to status
//! codes; the data layer decides how any sequence of statements is
//! executed safely.
//!
//! ## Example
//!
//! ```rust,ignore
//! use agora::db::{executor, transaction};
//! use agora::{Batch, ConnectionScope, Statement};
//!
//! let mut scope = ConnectionScope::new("data.db");
//! let batch = Batch::new()
//!     .with(Statement::new("INSERT INTO votes (upvotes, downvotes) VALUES (0, 0)"))
//!     .with(Statement::new("SELECT last_insert_rowid()"));
//! let results = transaction::apply_returning(&mut scope, &batch)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod db;
pub mod observability;
pub mod server;
pub mod services;

// Re-exports for convenience
pub use config::AgoraConfig;
pub use db::{Batch, ConnectionScope, Order, ResultSet, Row, SelectBuilder, Statement};

/// Error type for agora operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `BatchMismatch` | A batch pairs N statement texts with M argument lists |
/// | `StatementFailed` | A statement fails inside the storage engine |
/// | `OperationFailed` | Connection open, config load, or server setup fails |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A statement batch paired parallel sequences of different lengths.
    ///
    /// This is a contract violation by the caller, raised before any
    /// statement executes. It is distinct from a runtime storage failure.
    #[error("batch mismatch: {statements} statements, {argument_lists} argument lists")]
    BatchMismatch {
        /// Number of statement texts supplied.
        statements: usize,
        /// Number of argument lists supplied.
        argument_lists: usize,
    },

    /// A statement failed inside the storage engine.
    ///
    /// Raised when:
    /// - A constraint violation rejects a write
    /// - Statement text fails to prepare or bind
    /// - The database is locked past the busy timeout
    ///
    /// Callers treat this as a recoverable outcome; the HTTP layer alone
    /// decides the user-visible status code.
    #[error("statement '{operation}' failed: {cause}")]
    StatementFailed {
        /// The statement operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// An operation outside statement execution failed.
    ///
    /// Raised when:
    /// - Opening the database file fails
    /// - The configuration file cannot be read or parsed
    /// - The server fails to bind or serve
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for agora operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::BatchMismatch {
            statements: 3,
            argument_lists: 2,
        };
        assert_eq!(err.to_string(), "batch mismatch: 3 statements, 2 argument lists");

        let err = Error::StatementFailed {
            operation: "execute".to_string(),
            cause: "UNIQUE constraint failed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "statement 'execute' failed: UNIQUE constraint failed"
        );

        let err = Error::OperationFailed {
            operation: "open_connection".to_string(),
            cause: "unable to open database file".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 'open_connection' failed: unable to open database file"
        );
    }
}
