//! Vote counters: tallies, scoring, and up/down adjustments.

use crate::db::builder::{Order, SelectBuilder};
use crate::db::executor;
use crate::db::statement::Statement;
use crate::server::AppState;
use crate::services::{failure, not_found, parse_id, reply, rows};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use rusqlite::types::Value;
use serde::Deserialize;

/// Routes nested under `/votes`.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/all", get(all))
        .route("/get", get(get_votes))
        .route("/upvote", post(upvote))
        .route("/downvote", post(downvote))
        .route("/top", get(top))
        .route("/list", post(list))
}

#[derive(Debug, Deserialize)]
struct PostIdParams {
    post_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostIdBody {
    post_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TopParams {
    n: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListBody {
    post_ids: Option<Vec<i64>>,
}

async fn all(State(state): State<AppState>) -> Response {
    let mut scope = state.scope();
    match executor::fetch_all(&mut scope, &Statement::new("SELECT * FROM votes")) {
        Ok(tallies) => rows(&tallies),
        Err(e) => failure(&e),
    }
}

async fn get_votes(State(state): State<AppState>, Query(params): Query<PostIdParams>) -> Response {
    let Some(post_id) = params.post_id else {
        return reply(StatusCode::CONFLICT, "Post id is not provided");
    };
    let Some(post_id) = parse_id(&post_id) else {
        return not_found();
    };

    let mut scope = state.scope();
    let row = executor::fetch_one(
        &mut scope,
        &Statement::new(
            "SELECT upvotes, downvotes FROM votes \
             INNER JOIN posts ON posts.vote_id = votes.vote_id WHERE post_id = ?",
        )
        .bind(post_id),
    );
    match row {
        Ok(Some(row)) => rows(&row),
        Ok(None) => not_found(),
        Err(e) => failure(&e),
    }
}

async fn upvote(State(state): State<AppState>, Json(body): Json<PostIdBody>) -> Response {
    adjust(&state, body.post_id, "upvotes = upvotes + 1")
}

async fn downvote(State(state): State<AppState>, Json(body): Json<PostIdBody>) -> Response {
    adjust(&state, body.post_id, "downvotes = downvotes + 1")
}

/// Bumps one counter on the vote row linked to `post_id`. Touching zero
/// rows means the post does not exist, which is a 404 rather than an
/// error.
fn adjust(state: &AppState, post_id: Option<i64>, assignment: &str) -> Response {
    let Some(post_id) = post_id else {
        return reply(StatusCode::CONFLICT, "Post id is not provided");
    };

    let mut scope = state.scope();
    let updated = executor::execute(
        &mut scope,
        &Statement::new(format!(
            "UPDATE votes SET {assignment} \
             WHERE vote_id IN (SELECT vote_id FROM posts WHERE post_id = ?)"
        ))
        .bind(post_id),
    );
    match updated {
        Ok(0) => not_found(),
        Ok(_) => reply(StatusCode::CREATED, "Vote updated"),
        Err(e) => failure(&e),
    }
}

async fn top(State(state): State<AppState>, Query(params): Query<TopParams>) -> Response {
    let n = match params.n {
        Some(raw) => match parse_id(&raw) {
            Some(n) => n,
            None => return not_found(),
        },
        None => 50,
    };
    let statement = SelectBuilder::new(
        "SELECT posts.post_id FROM posts INNER JOIN votes ON posts.vote_id = votes.vote_id",
    )
    .order_by("abs(upvotes - downvotes)", Order::Desc)
    .limit(n)
    .build();

    let mut scope = state.scope();
    match executor::fetch_all(&mut scope, &statement) {
        Ok(scored) if scored.is_empty() => not_found(),
        Ok(scored) => rows(&scored),
        Err(e) => failure(&e),
    }
}

async fn list(State(state): State<AppState>, Json(body): Json<ListBody>) -> Response {
    let post_ids = body.post_ids.unwrap_or_default();
    if post_ids.is_empty() {
        return reply(StatusCode::CONFLICT, "Post ids are not provided");
    }

    let statement = SelectBuilder::new(
        "SELECT votes.vote_id, upvotes, downvotes FROM posts \
         INNER JOIN votes ON posts.vote_id = votes.vote_id",
    )
    .filter_in("posts.post_id", post_ids.into_iter().map(Value::from).collect())
    .order_by("(upvotes - downvotes)", Order::Desc)
    .build();

    let mut scope = state.scope();
    match executor::fetch_all(&mut scope, &statement) {
        Ok(scored) if scored.is_empty() => not_found(),
        Ok(scored) => rows(&scored),
        Err(e) => failure(&e),
    }
}
