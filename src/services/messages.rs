//! Direct messages: sending, deletion, and favorite markers.

use crate::db::statement::{Batch, Statement};
use crate::db::{executor, transaction};
use crate::server::AppState;
use crate::services::{failure, parse_id, reply};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{delete, post};
use serde::Deserialize;

/// Routes nested under `/messages`.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/send", post(send))
        .route("/delete", delete(delete_message))
        .route("/favorite", post(favorite))
}

#[derive(Debug, Deserialize)]
struct SendBody {
    user_from: Option<String>,
    user_to: Option<String>,
    msg_content: Option<String>,
    msg_flag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MsgIdParams {
    msg_id: Option<String>,
}

async fn send(State(state): State<AppState>, Json(body): Json<SendBody>) -> Response {
    let (Some(user_from), Some(user_to)) = (body.user_from, body.user_to) else {
        return reply(StatusCode::CONFLICT, "Sender / Recipient is not provided");
    };

    let mut scope = state.scope();
    for (username, missing) in [
        (&user_from, "Sender not found"),
        (&user_to, "Receiver not found"),
    ] {
        let account = executor::fetch_one(
            &mut scope,
            &Statement::new("SELECT username FROM users WHERE username = ?")
                .bind(username.clone()),
        );
        match account {
            Ok(Some(_)) => {},
            Ok(None) => return reply(StatusCode::NOT_FOUND, missing),
            Err(e) => return failure(&e),
        }
    }

    // Both username-to-id subselects resolve inside the same transaction
    // the insert runs in, so a concurrent account deletion cannot split
    // them.
    let batch = Batch::new().with(
        Statement::new(
            "INSERT INTO messages (user_from, user_to, msg_content, msg_flag) \
             VALUES ((SELECT user_id FROM users WHERE username = ?), \
             (SELECT user_id FROM users WHERE username = ?), ?, ?)",
        )
        .bind(user_from)
        .bind(user_to)
        .bind(body.msg_content)
        .bind(body.msg_flag),
    );

    match transaction::apply(&mut scope, &batch) {
        Ok(()) => reply(StatusCode::CREATED, "Message sent"),
        Err(e) => failure(&e),
    }
}

async fn delete_message(
    State(state): State<AppState>,
    Query(params): Query<MsgIdParams>,
) -> Response {
    let Some(msg_id) = params.msg_id else {
        return reply(StatusCode::CONFLICT, "Message id is not provided");
    };
    let Some(msg_id) = parse_id(&msg_id) else {
        return reply(StatusCode::NOT_FOUND, "Message does not exist");
    };

    let mut scope = state.scope();
    match message_exists(&mut scope, msg_id) {
        Ok(false) => return reply(StatusCode::NOT_FOUND, "Message does not exist"),
        Ok(true) => {},
        Err(e) => return failure(&e),
    }

    // The favorite marker references the message, so it goes first
    let batch = Batch::new()
        .with(Statement::new("DELETE FROM favorite WHERE msg_id = ?").bind(msg_id))
        .with(Statement::new("DELETE FROM messages WHERE msg_id = ?").bind(msg_id));

    match transaction::apply(&mut scope, &batch) {
        Ok(()) => {
            tracing::debug!(msg_id, "Message deleted");
            reply(StatusCode::OK, "Message deleted")
        },
        Err(e) => failure(&e),
    }
}

async fn favorite(State(state): State<AppState>, Query(params): Query<MsgIdParams>) -> Response {
    let Some(msg_id) = params.msg_id else {
        return reply(StatusCode::CONFLICT, "Message id is not provided");
    };
    let Some(msg_id) = parse_id(&msg_id) else {
        return reply(StatusCode::NOT_FOUND, "Message does not exist");
    };

    let mut scope = state.scope();
    match message_exists(&mut scope, msg_id) {
        Ok(false) => return reply(StatusCode::NOT_FOUND, "Message does not exist"),
        Ok(true) => {},
        Err(e) => return failure(&e),
    }

    let marked = executor::fetch_one(
        &mut scope,
        &Statement::new("SELECT msg_id FROM favorite WHERE msg_id = ?").bind(msg_id),
    );
    match marked {
        Ok(Some(_)) => return reply(StatusCode::NOT_FOUND, "Message already favorited"),
        Ok(None) => {},
        Err(e) => return failure(&e),
    }

    let inserted = executor::execute(
        &mut scope,
        &Statement::new("INSERT INTO favorite (msg_id) VALUES (?)").bind(msg_id),
    );
    match inserted {
        Ok(_) => reply(StatusCode::CREATED, "Message favorited"),
        Err(e) => failure(&e),
    }
}

fn message_exists(scope: &mut crate::db::ConnectionScope, msg_id: i64) -> crate::Result<bool> {
    let row = executor::fetch_one(
        scope,
        &Statement::new("SELECT msg_id FROM messages WHERE msg_id = ?").bind(msg_id),
    )?;
    Ok(row.is_some())
}
