//! Property-based tests for statement assembly.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Clause text and argument list never drift apart
//! - WHERE appears exactly when at least one predicate is present
//! - IN expansion emits one placeholder per element
//! - Batch pairing accepts exactly the equal-length cases

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use agora::db::{Order, SelectBuilder, Value};
use agora::{Batch, Statement};
use proptest::prelude::*;

/// Column names the generators draw from; what matters is that they are
/// distinct, not what they are.
fn column() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["post_id", "username", "published", "title", "community_name"])
}

proptest! {
    /// Property: placeholder count in the text equals the argument count.
    #[test]
    fn prop_placeholders_match_args(
        columns in prop::collection::vec(column(), 0..5),
        values in prop::collection::vec("[a-z]{1,12}", 0..5),
        limit in prop::option::of(1i64..1000),
    ) {
        let mut builder = SelectBuilder::new("SELECT * FROM posts");
        for (column, value) in columns.iter().zip(&values) {
            builder = builder.filter(column, value.clone());
        }
        if let Some(n) = limit {
            builder = builder.limit(n);
        }
        let statement = builder.build();

        let placeholders = statement.text().matches('?').count();
        prop_assert_eq!(placeholders, statement.args().len());
    }

    /// Property: WHERE appears iff at least one predicate was added, and
    /// the clause count equals the predicate count.
    #[test]
    fn prop_where_present_iff_predicates(
        columns in prop::collection::vec(column(), 0..5),
    ) {
        let mut builder = SelectBuilder::new("SELECT * FROM posts");
        for column in &columns {
            builder = builder.filter(column, 1i64);
        }
        let statement = builder.build();

        prop_assert_eq!(statement.text().contains(" WHERE "), !columns.is_empty());
        prop_assert_eq!(statement.text().matches(" AND ").count(), columns.len().saturating_sub(1));
        prop_assert!(!statement.text().contains("WHERE AND"));
    }

    /// Property: IN expansion uses one placeholder per element and binds
    /// the elements in order.
    #[test]
    fn prop_in_expansion_parameter_per_element(ids in prop::collection::vec(1i64..10_000, 1..20)) {
        let statement = SelectBuilder::new("SELECT * FROM votes")
            .filter_in("vote_id", ids.iter().copied().map(Value::from).collect())
            .build();

        prop_assert_eq!(statement.text().matches('?').count(), ids.len());
        let bound: Vec<i64> = statement
            .args()
            .iter()
            .map(|value| match value {
                Value::Integer(n) => *n,
                other => panic!("unexpected arg: {other:?}"),
            })
            .collect();
        prop_assert_eq!(bound, ids);
    }

    /// Property: the limit argument is always last, whatever the call order.
    #[test]
    fn prop_limit_arg_is_last(
        columns in prop::collection::vec(column(), 1..5),
        n in 1i64..1000,
        order_first in any::<bool>(),
    ) {
        let mut builder = SelectBuilder::new("SELECT * FROM posts");
        if order_first {
            builder = builder.limit(n).order_by("published", Order::Desc);
        }
        for column in &columns {
            builder = builder.filter(column, "x".to_string());
        }
        if !order_first {
            builder = builder.order_by("published", Order::Desc).limit(n);
        }
        let statement = builder.build();

        prop_assert!(statement.text().ends_with("LIMIT ?"));
        prop_assert_eq!(statement.args().last(), Some(&Value::Integer(n)));
    }

    /// Property: paired construction succeeds exactly when lengths match.
    #[test]
    fn prop_paired_accepts_equal_lengths_only(
        text_count in 0usize..6,
        args_count in 0usize..6,
    ) {
        let texts: Vec<&str> = (0..text_count).map(|_| "SELECT 1").collect();
        let arg_lists: Vec<Vec<Value>> = (0..args_count).map(|_| Vec::new()).collect();

        let result = Batch::paired(&texts, arg_lists);
        if text_count == args_count {
            prop_assert_eq!(result.unwrap().len(), text_count);
        } else {
            // prop_assert! stringifies its condition into a format
            // string, so struct-pattern braces cannot appear inline
            let mismatch = matches!(
                result,
                Err(agora::Error::BatchMismatch { statements, argument_lists })
                    if statements == text_count && argument_lists == args_count
            );
            prop_assert!(mismatch);
        }
    }

    /// Property: bind preserves argument order.
    #[test]
    fn prop_bind_preserves_order(values in prop::collection::vec("[a-z]{1,8}", 0..10)) {
        let mut statement = Statement::new("SELECT 1");
        for value in &values {
            statement = statement.bind(value.clone());
        }

        let bound: Vec<&str> = statement
            .args()
            .iter()
            .map(|value| match value {
                Value::Text(s) => s.as_str(),
                other => panic!("unexpected arg: {other:?}"),
            })
            .collect();
        prop_assert_eq!(bound, values.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
