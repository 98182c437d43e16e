//! Request-scoped data access over `SQLite`.
//!
//! Everything the HTTP services know about the store goes through this
//! module: a [`ConnectionScope`] owns one connection for the lifetime of a
//! request, the [`executor`] runs single statements, the [`transaction`]
//! executor runs ordered batches with an all-or-nothing guarantee, and the
//! [`SelectBuilder`] assembles filtered list queries so that statement text
//! and positional arguments can never drift apart.

pub mod builder;
pub mod executor;
mod metrics;
pub mod row;
pub mod schema;
pub mod scope;
pub mod statement;
pub mod transaction;

pub use builder::{Order, SelectBuilder};
pub use row::{ResultSet, Row};
pub use rusqlite::types::Value;
pub use scope::ConnectionScope;
pub use statement::{Batch, Statement};
