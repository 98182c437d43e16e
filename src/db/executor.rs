//! Single-statement execution with guaranteed scope release.
//!
//! Each entry point runs one statement against the scope's connection and
//! releases the scope before returning, success or failure. Reads close
//! without a commit obligation; writes are committed by the engine as the
//! statement completes, then closed. Storage failures come back as
//! [`Error::StatementFailed`], never as a panic, and an empty single-row
//! lookup is `Ok(None)` rather than an error.

use crate::db::metrics::record_access_metrics;
use crate::db::row::{ResultSet, Row};
use crate::db::scope::ConnectionScope;
use crate::db::statement::Statement;
use crate::{Error, Result};
use rusqlite::{Connection, params_from_iter};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Runs a statement and collects every result row.
///
/// # Errors
///
/// Returns [`Error::StatementFailed`] if the statement fails to prepare,
/// bind, or step, and [`Error::OperationFailed`] if the database cannot
/// be opened.
#[instrument(skip(scope, statement), fields(operation = "fetch_all"))]
pub fn fetch_all(scope: &mut ConnectionScope, statement: &Statement) -> Result<ResultSet> {
    let start = Instant::now();
    let result = scope
        .acquire()
        .and_then(|conn| query_all(conn, statement));
    scope.release();

    let status = if result.is_ok() { "success" } else { "error" };
    record_access_metrics("fetch_all", start, status);
    result
}

/// Runs a statement and returns its first row, or `None` for zero rows.
///
/// Absence is an expected outcome, not an error; callers decide whether
/// a missing row is itself an error condition.
///
/// # Errors
///
/// Returns [`Error::StatementFailed`] if the statement fails to prepare,
/// bind, or step, and [`Error::OperationFailed`] if the database cannot
/// be opened.
#[instrument(skip(scope, statement), fields(operation = "fetch_one"))]
pub fn fetch_one(scope: &mut ConnectionScope, statement: &Statement) -> Result<Option<Row>> {
    let start = Instant::now();
    let result = scope
        .acquire()
        .and_then(|conn| query_all(conn, statement))
        .map(|rows| rows.into_iter().next());
    scope.release();

    let status = if result.is_ok() { "success" } else { "error" };
    record_access_metrics("fetch_one", start, status);
    result
}

/// Runs a write statement and returns the number of rows changed.
///
/// Outside a transaction the engine commits the statement as it
/// completes, so the scope is released with the write already durable.
///
/// # Errors
///
/// Returns [`Error::StatementFailed`] if the statement fails, and
/// [`Error::OperationFailed`] if the database cannot be opened.
#[instrument(skip(scope, statement), fields(operation = "execute"))]
pub fn execute(scope: &mut ConnectionScope, statement: &Statement) -> Result<usize> {
    let start = Instant::now();
    let result = scope.acquire().and_then(|conn| {
        conn.execute(statement.text(), params_from_iter(statement.args().iter()))
            .map_err(|e| Error::StatementFailed {
                operation: "execute".to_string(),
                cause: e.to_string(),
            })
    });
    scope.release();

    let status = if result.is_ok() { "success" } else { "error" };
    record_access_metrics("execute", start, status);
    result
}

/// Prepares and steps one statement on an already-acquired connection,
/// mapping every row. Shared with the transactional executor, which runs
/// statements against one open transaction without per-call release.
pub(crate) fn query_all(conn: &Connection, statement: &Statement) -> Result<ResultSet> {
    let mut stmt = conn
        .prepare(statement.text())
        .map_err(|e| Error::StatementFailed {
            operation: "prepare".to_string(),
            cause: e.to_string(),
        })?;

    // Capture the header before stepping; all rows share it
    let columns: Arc<[String]> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>()
        .into();

    let mut rows = stmt
        .query(params_from_iter(statement.args().iter()))
        .map_err(|e| Error::StatementFailed {
            operation: "bind".to_string(),
            cause: e.to_string(),
        })?;

    let mut collected = ResultSet::new();
    while let Some(row) = rows.next().map_err(|e| Error::StatementFailed {
        operation: "step".to_string(),
        cause: e.to_string(),
    })? {
        collected.push(Row::from_sql_row(Arc::clone(&columns), row)?);
    }
    Ok(collected)
}
