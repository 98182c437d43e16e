//! Structural assembly of filtered SELECT statements.
//!
//! Callers add predicates one at a time; each predicate contributes its
//! SQL fragment and its argument in the same step, so the clause list and
//! the argument list cannot drift apart. The final text is assembled once
//! in [`SelectBuilder::build`]: no `WHERE` keyword appears when no
//! predicate was added, clauses are joined with `AND` in insertion order,
//! and the `LIMIT` value rides as the last positional argument rather
//! than being spliced into the text.

use crate::db::statement::Statement;
use rusqlite::types::Value;

/// Sort direction for [`SelectBuilder::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Ascending (`ASC`).
    Asc,
    /// Descending (`DESC`).
    Desc,
}

impl Order {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Builder for `SELECT` statements with a variable predicate set.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    base: String,
    clauses: Vec<String>,
    args: Vec<Value>,
    order: Option<String>,
    limit: Option<i64>,
}

impl SelectBuilder {
    /// Starts a builder from the projection and table, e.g.
    /// `SELECT * FROM posts`.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            clauses: Vec::new(),
            args: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Adds an equality predicate on `column`.
    #[must_use]
    pub fn filter(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.clauses.push(format!("{column} = ?"));
        self.args.push(value.into());
        self
    }

    /// Adds a membership predicate on `column` with one placeholder per
    /// element. An empty list adds no clause at all.
    #[must_use]
    pub fn filter_in(mut self, column: &str, values: Vec<Value>) -> Self {
        if values.is_empty() {
            return self;
        }
        let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
        self.clauses
            .push(format!("{column} IN ({})", placeholders.join(",")));
        self.args.extend(values);
        self
    }

    /// Sets the sort expression. A later call replaces an earlier one.
    #[must_use]
    pub fn order_by(mut self, expression: &str, order: Order) -> Self {
        self.order = Some(format!("{expression} {}", order.as_sql()));
        self
    }

    /// Caps the number of rows returned. The cap is bound as the final
    /// positional argument.
    #[must_use]
    pub const fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Assembles the final statement.
    #[must_use]
    pub fn build(self) -> Statement {
        let mut text = self.base;
        let mut args = self.args;

        if !self.clauses.is_empty() {
            text.push_str(" WHERE ");
            text.push_str(&self.clauses.join(" AND "));
        }
        if let Some(order) = self.order {
            text.push_str(" ORDER BY ");
            text.push_str(&order);
        }
        if let Some(limit) = self.limit {
            text.push_str(" LIMIT ?");
            args.push(Value::from(limit));
        }

        Statement::with_args(text, args)
    }
}
