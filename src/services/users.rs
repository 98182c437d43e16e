//! Account registration, email updates, karma, and deletion.

use crate::db::executor;
use crate::db::statement::Statement;
use crate::server::AppState;
use crate::services::{failure, reply};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{delete, post, put};
use serde::Deserialize;

/// Routes nested under `/users`.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/register", post(register))
        .route("/update_email", put(update_email))
        .route("/add_karma", put(add_karma))
        .route("/remove_karma", put(remove_karma))
        .route("/delete", delete(delete_user))
}

#[derive(Debug, Deserialize)]
struct AccountBody {
    username: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsernameBody {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsernameParams {
    username: Option<String>,
}

/// Looks up whether `username` exists. Shared by every handler that
/// requires a known account; the caller's scope is reused, so one
/// request builds one scope.
fn username_exists(
    scope: &mut crate::db::ConnectionScope,
    username: &str,
) -> crate::Result<bool> {
    let row = executor::fetch_one(
        scope,
        &Statement::new("SELECT username FROM users WHERE username = ?")
            .bind(username.to_string()),
    )?;
    Ok(row.is_some())
}

async fn register(State(state): State<AppState>, Json(body): Json<AccountBody>) -> Response {
    let (Some(username), Some(email)) = (body.username, body.email) else {
        return reply(StatusCode::CONFLICT, "Username / Email is not provided");
    };

    let mut scope = state.scope();
    let taken = executor::fetch_one(
        &mut scope,
        &Statement::new("SELECT username, email FROM users WHERE username = ? OR email = ?")
            .bind(username.clone())
            .bind(email.clone()),
    );
    match taken {
        Ok(Some(_)) => {
            return reply(StatusCode::NOT_FOUND, "Username / Email has been taken");
        },
        Ok(None) => {},
        Err(e) => return failure(&e),
    }

    let inserted = executor::execute(
        &mut scope,
        &Statement::new("INSERT INTO users (username, email) VALUES (?, ?)")
            .bind(username.clone())
            .bind(email),
    );
    match inserted {
        Ok(_) => {
            tracing::debug!(username = %username, "User registered");
            reply(StatusCode::CREATED, "User created")
        },
        Err(e) => failure(&e),
    }
}

async fn update_email(State(state): State<AppState>, Json(body): Json<AccountBody>) -> Response {
    let (Some(username), Some(email)) = (body.username, body.email) else {
        return reply(StatusCode::CONFLICT, "Username / Email is not provided");
    };

    let mut scope = state.scope();
    match username_exists(&mut scope, &username) {
        Ok(false) => return reply(StatusCode::NOT_FOUND, "Username not found"),
        Ok(true) => {},
        Err(e) => return failure(&e),
    }

    let updated = executor::execute(
        &mut scope,
        &Statement::new("UPDATE users SET email = ? WHERE username = ?")
            .bind(email)
            .bind(username),
    );
    match updated {
        Ok(_) => reply(StatusCode::OK, "Email updated"),
        Err(e) => failure(&e),
    }
}

async fn add_karma(State(state): State<AppState>, Json(body): Json<UsernameBody>) -> Response {
    adjust_karma(&state, body.username, "karma + 1", "Karma added")
}

async fn remove_karma(State(state): State<AppState>, Json(body): Json<UsernameBody>) -> Response {
    adjust_karma(&state, body.username, "karma - 1", "Karma deducted")
}

fn adjust_karma(
    state: &AppState,
    username: Option<String>,
    adjustment: &str,
    success: &str,
) -> Response {
    let Some(username) = username else {
        return reply(StatusCode::CONFLICT, "Username is not provided");
    };

    let mut scope = state.scope();
    match username_exists(&mut scope, &username) {
        Ok(false) => return reply(StatusCode::NOT_FOUND, "Username not found"),
        Ok(true) => {},
        Err(e) => return failure(&e),
    }

    let updated = executor::execute(
        &mut scope,
        &Statement::new(format!("UPDATE users SET karma = {adjustment} WHERE username = ?"))
            .bind(username),
    );
    match updated {
        Ok(_) => reply(StatusCode::OK, success),
        Err(e) => failure(&e),
    }
}

async fn delete_user(
    State(state): State<AppState>,
    Query(params): Query<UsernameParams>,
) -> Response {
    let Some(username) = params.username else {
        return reply(StatusCode::CONFLICT, "Username is not provided");
    };

    let mut scope = state.scope();
    match username_exists(&mut scope, &username) {
        Ok(false) => return reply(StatusCode::NOT_FOUND, "Username not found"),
        Ok(true) => {},
        Err(e) => return failure(&e),
    }

    let deleted = executor::execute(
        &mut scope,
        &Statement::new("DELETE FROM users WHERE username = ?").bind(username.clone()),
    );
    match deleted {
        Ok(_) => {
            tracing::debug!(username = %username, "User deleted");
            reply(StatusCode::OK, "User deleted")
        },
        Err(e) => failure(&e),
    }
}
