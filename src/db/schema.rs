//! Table definitions and idempotent initialization.

use crate::db::scope::ConnectionScope;
use crate::{Error, Result};

/// Full DDL for the agora store. Every statement is `IF NOT EXISTS`, so
/// re-running `init` against a live database is a no-op.
const SCHEMA: &str = r"
    -- Accounts; karma starts at 1 on registration
    CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        karma INTEGER NOT NULL DEFAULT 1
    );

    -- Communities posts are published into
    CREATE TABLE IF NOT EXISTS community (
        community_id INTEGER PRIMARY KEY AUTOINCREMENT,
        community_name TEXT NOT NULL UNIQUE
    );

    -- One counter row per post, created in the same batch as the post
    CREATE TABLE IF NOT EXISTS votes (
        vote_id INTEGER PRIMARY KEY AUTOINCREMENT,
        upvotes INTEGER NOT NULL DEFAULT 0,
        downvotes INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS posts (
        post_id INTEGER PRIMARY KEY AUTOINCREMENT,
        community_id INTEGER,
        title TEXT NOT NULL,
        description TEXT,
        resource_url TEXT,
        published TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        username TEXT,
        vote_id INTEGER
    );

    -- Direct messages between users
    CREATE TABLE IF NOT EXISTS messages (
        msg_id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_from INTEGER,
        user_to INTEGER,
        msg_time TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        msg_content TEXT,
        msg_flag TEXT
    );

    -- Favorite markers; at most one per message
    CREATE TABLE IF NOT EXISTS favorite (
        msg_id INTEGER PRIMARY KEY
    );

    CREATE INDEX IF NOT EXISTS idx_posts_published ON posts(published DESC);
    CREATE INDEX IF NOT EXISTS idx_posts_username ON posts(username);
    CREATE INDEX IF NOT EXISTS idx_posts_community ON posts(community_id);
    CREATE INDEX IF NOT EXISTS idx_messages_user_to ON messages(user_to);
";

/// Applies the schema through the given scope.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the database cannot be opened and
/// [`Error::StatementFailed`] if the DDL fails to apply.
pub fn init(scope: &mut ConnectionScope) -> Result<()> {
    let result = scope.acquire().and_then(|conn| {
        conn.execute_batch(SCHEMA).map_err(|e| Error::StatementFailed {
            operation: "apply_schema".to_string(),
            cause: e.to_string(),
        })
    });
    scope.release();
    if result.is_ok() {
        tracing::info!(path = %scope.path().display(), "Schema initialized");
    }
    result
}
