//! All-or-nothing execution of statement batches.
//!
//! A batch moves through `Idle -> Begun -> {Committed | RolledBack}`.
//! `BEGIN IMMEDIATE` declares write intent up front so concurrent writers
//! queue on the busy timeout instead of failing mid-batch. Statements run
//! strictly in order on the same open transaction; the first failure
//! short-circuits the rest, rolls back, and reports
//! [`Error::StatementFailed`] - a batch is never partially visible to
//! subsequent readers. The scope is released exactly once after either
//! terminal state.
//!
//! Length mismatches between statement texts and argument lists cannot
//! reach this module: [`Batch::paired`](crate::Batch::paired) rejects
//! them before construction, so no `BEGIN` is ever issued for a
//! malformed batch.

use crate::db::executor::query_all;
use crate::db::metrics::record_access_metrics;
use crate::db::row::ResultSet;
use crate::db::scope::ConnectionScope;
use crate::db::statement::Batch;
use crate::{Error, Result};
use std::time::Instant;
use tracing::instrument;

/// Applies a batch atomically, discarding per-statement results.
///
/// # Errors
///
/// Returns [`Error::StatementFailed`] if any statement fails; the whole
/// batch is rolled back. Returns [`Error::OperationFailed`] if the
/// database cannot be opened.
#[instrument(skip(scope, batch), fields(operation = "apply", statements = batch.len()))]
pub fn apply(scope: &mut ConnectionScope, batch: &Batch) -> Result<()> {
    run(scope, batch, false).map(|_| ())
}

/// Applies a batch atomically, collecting each statement's result set in
/// statement order.
///
/// # Errors
///
/// Returns [`Error::StatementFailed`] if any statement fails; the whole
/// batch is rolled back. Returns [`Error::OperationFailed`] if the
/// database cannot be opened.
#[instrument(skip(scope, batch), fields(operation = "apply_returning", statements = batch.len()))]
pub fn apply_returning(scope: &mut ConnectionScope, batch: &Batch) -> Result<Vec<ResultSet>> {
    run(scope, batch, true)
}

fn run(scope: &mut ConnectionScope, batch: &Batch, collect: bool) -> Result<Vec<ResultSet>> {
    let start = Instant::now();
    let result = (|| {
        let conn = scope.acquire()?;

        conn.execute("BEGIN IMMEDIATE", [])
            .map_err(|e| Error::StatementFailed {
                operation: "begin_transaction".to_string(),
                cause: e.to_string(),
            })?;

        let outcome = (|| {
            let mut results = Vec::new();
            for statement in batch.statements() {
                let rows = query_all(conn, statement)?;
                if collect {
                    results.push(rows);
                }
            }
            Ok(results)
        })();

        match outcome {
            Ok(results) => {
                conn.execute("COMMIT", [])
                    .map_err(|e| Error::StatementFailed {
                        operation: "commit_transaction".to_string(),
                        cause: e.to_string(),
                    })?;
                tracing::debug!(statements = batch.len(), "Transaction committed");
                metrics::counter!("agora_transactions_committed_total").increment(1);
                Ok(results)
            },
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                tracing::warn!(error = %e, statements = batch.len(), "Transaction rolled back");
                metrics::counter!("agora_transactions_rolled_back_total").increment(1);
                Err(e)
            },
        }
    })();
    scope.release();

    let status = if result.is_ok() { "success" } else { "error" };
    record_access_metrics("transaction", start, status);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::executor;
    use crate::db::schema;
    use crate::db::statement::Statement;
    use tempfile::TempDir;

    fn create_test_scope() -> (TempDir, ConnectionScope) {
        let dir = TempDir::new().unwrap();
        let mut scope = ConnectionScope::new(dir.path().join("transaction.db"));
        schema::init(&mut scope).unwrap();
        (dir, scope)
    }

    fn count(scope: &mut ConnectionScope, table: &str) -> i64 {
        let rows = executor::fetch_all(
            scope,
            &Statement::new(format!("SELECT count(*) AS n FROM {table}")),
        )
        .unwrap();
        match rows[0].get("n") {
            Some(rusqlite::types::Value::Integer(n)) => *n,
            other => panic!("unexpected count value: {other:?}"),
        }
    }

    #[test]
    fn test_successful_batch_commits() {
        let (_dir, mut scope) = create_test_scope();

        let batch = Batch::new()
            .with(Statement::new("INSERT INTO votes (upvotes, downvotes) VALUES (0, 0)"))
            .with(
                Statement::new("INSERT INTO community (community_name) VALUES (?)")
                    .bind("algebra".to_string()),
            );
        apply(&mut scope, &batch).unwrap();
        assert!(!scope.is_open());

        assert_eq!(count(&mut scope, "votes"), 1);
        assert_eq!(count(&mut scope, "community"), 1);
    }

    #[test]
    fn test_failed_batch_rolls_back_earlier_statements() {
        let (_dir, mut scope) = create_test_scope();

        // Second statement violates NOT NULL on posts.title
        let batch = Batch::new()
            .with(
                Statement::new("INSERT INTO community (community_name) VALUES (?)")
                    .bind("algebra".to_string()),
            )
            .with(Statement::new(
                "INSERT INTO posts (community_id, title, username, vote_id) \
                 VALUES (1, NULL, 'ada', 1)",
            ));

        let result = apply(&mut scope, &batch);
        assert!(matches!(result, Err(Error::StatementFailed { .. })));
        assert!(!scope.is_open());

        // The community insert from statement one must not persist
        assert_eq!(count(&mut scope, "community"), 0);
    }

    #[test]
    fn test_short_circuit_skips_later_statements() {
        let (_dir, mut scope) = create_test_scope();

        let batch = Batch::new()
            .with(Statement::new("INSERT INTO broken syntax"))
            .with(
                Statement::new("INSERT INTO community (community_name) VALUES (?)")
                    .bind("algebra".to_string()),
            );

        assert!(apply(&mut scope, &batch).is_err());
        assert_eq!(count(&mut scope, "community"), 0);
    }

    #[test]
    fn test_apply_returning_collects_in_statement_order() {
        let (_dir, mut scope) = create_test_scope();

        let batch = Batch::new()
            .with(Statement::new("INSERT INTO votes (upvotes, downvotes) VALUES (0, 0)"))
            .with(Statement::new("SELECT last_insert_rowid() AS vote_id"));
        let results = apply_returning(&mut scope, &batch).unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_empty());
        assert_eq!(
            results[1][0].get("vote_id"),
            Some(&rusqlite::types::Value::Integer(1))
        );
    }

    #[test]
    fn test_empty_batch_commits_cleanly() {
        let (_dir, mut scope) = create_test_scope();

        let results = apply_returning(&mut scope, &Batch::new()).unwrap();
        assert!(results.is_empty());
        assert!(!scope.is_open());
    }

    #[test]
    fn test_effects_visible_after_return() {
        let (_dir, mut scope) = create_test_scope();

        let batch = Batch::new().with(
            Statement::new("INSERT INTO users (username, email) VALUES (?, ?)")
                .bind("ada".to_string())
                .bind("ada@example.net".to_string()),
        );
        apply(&mut scope, &batch).unwrap();

        let row = executor::fetch_one(
            &mut scope,
            &Statement::new("SELECT karma FROM users WHERE username = ?")
                .bind("ada".to_string()),
        )
        .unwrap();
        assert!(row.is_some());
    }
}
