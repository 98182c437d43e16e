//! Parameterized statements and atomic batches.

use crate::{Error, Result};
use rusqlite::types::Value;

/// One parameterized statement: query text plus positional arguments.
///
/// The argument count must match the number of `?` placeholders in the
/// text; a mismatch is a caller programming error and surfaces as a bind
/// failure when the statement runs. Values are always carried as
/// positional arguments, never interpolated into the text.
#[derive(Debug, Clone)]
pub struct Statement {
    text: String,
    args: Vec<Value>,
}

impl Statement {
    /// Creates a statement with no arguments.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            args: Vec::new(),
        }
    }

    /// Creates a statement with a prepared argument list.
    #[must_use]
    pub fn with_args(text: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            text: text.into(),
            args,
        }
    }

    /// Appends one positional argument.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// The statement text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The positional arguments, in placeholder order.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

/// An ordered sequence of statements executed as one atomic transaction.
///
/// A batch built with [`Batch::push`] or [`Batch::with`] pairs each text
/// with its arguments at the call site and cannot mismatch. The parallel
/// sequence form used by callers that assemble texts and argument lists
/// separately goes through [`Batch::paired`], which rejects unequal
/// lengths before anything executes.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    statements: Vec<Statement>,
}

impl Batch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a batch from parallel text and argument-list sequences.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchMismatch`] when the sequences differ in
    /// length. This is a contract violation, not a storage failure, and
    /// no statement executes.
    pub fn paired(texts: &[&str], arg_lists: Vec<Vec<Value>>) -> Result<Self> {
        if texts.len() != arg_lists.len() {
            return Err(Error::BatchMismatch {
                statements: texts.len(),
                argument_lists: arg_lists.len(),
            });
        }
        let statements = texts
            .iter()
            .zip(arg_lists)
            .map(|(text, args)| Statement::with_args(*text, args))
            .collect();
        Ok(Self { statements })
    }

    /// Appends a statement to the batch.
    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Appends a statement, consuming and returning the batch.
    #[must_use]
    pub fn with(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    /// The statements in execution order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Number of statements in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the batch holds no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
