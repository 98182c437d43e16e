//! Post creation, lookup, filtered listing, and deletion.
//!
//! Creating a post is the one place the transactional executor earns its
//! keep: a fresh vote counter row, optionally a fresh community row, the
//! post itself, and the rowid read all land in one atomic batch.

use crate::db::builder::{Order, SelectBuilder};
use crate::db::statement::{Batch, Statement};
use crate::db::{executor, transaction};
use crate::server::AppState;
use crate::services::{failure, not_found, parse_id, reply, rows};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use axum::routing::{delete, get, post};
use rusqlite::types::Value;
use serde::Deserialize;

/// Routes nested under `/posts`.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/get", get(get_post))
        .route("/filter", get(filter))
        .route("/create", post(create))
        .route("/delete", delete(delete_post))
}

#[derive(Debug, Deserialize)]
struct PostIdParams {
    post_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FilterParams {
    post_id: Option<String>,
    username: Option<String>,
    published: Option<String>,
    title: Option<String>,
    community_name: Option<String>,
    n: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateBody {
    title: Option<String>,
    description: Option<String>,
    resource_url: Option<String>,
    username: Option<String>,
    community_name: Option<String>,
}

async fn get_post(State(state): State<AppState>, Query(params): Query<PostIdParams>) -> Response {
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
            "SELECT post_id, title, description, resource_url, published, username, \
             community_name FROM posts INNER JOIN community \
             ON posts.community_id = community.community_id WHERE post_id = ?",
        )
        .bind(post_id),
    );
    match row {
        Ok(Some(row)) => rows(&row),
        Ok(None) => not_found(),
        Err(e) => failure(&e),
    }
}

/// Lists the most recent posts matching any subset of the optional
/// filters. Predicates enter the builder in a fixed order (post id,
/// username, published, title, community name) so the generated text is
/// deterministic whatever the query string looked like.
async fn filter(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Response {
    let mut builder = SelectBuilder::new(
        "SELECT post_id, title, published, username, community_name FROM posts \
         INNER JOIN community ON posts.community_id = community.community_id",
    );
    if let Some(post_id) = params.post_id {
        let Some(post_id) = parse_id(&post_id) else {
            return not_found();
        };
        builder = builder.filter("post_id", post_id);
    }
    if let Some(username) = params.username {
        builder = builder.filter("username", username);
    }
    if let Some(published) = params.published {
        builder = builder.filter("published", published);
    }
    if let Some(title) = params.title {
        builder = builder.filter("title", title);
    }
    if let Some(community_name) = params.community_name {
        builder = builder.filter("community_name", community_name);
    }
    let n = match params.n {
        Some(raw) => match parse_id(&raw) {
            Some(n) => n,
            None => return not_found(),
        },
        None => 100,
    };
    let statement = builder
        .order_by("published", Order::Desc)
        .limit(n)
        .build();

    let mut scope = state.scope();
    match executor::fetch_all(&mut scope, &statement) {
        Ok(matched) if matched.is_empty() => not_found(),
        Ok(matched) => rows(&matched),
        Err(e) => failure(&e),
    }
}

async fn create(State(state): State<AppState>, Json(body): Json<CreateBody>) -> Response {
    let (Some(title), Some(username), Some(community_name)) =
        (body.title, body.username, body.community_name)
    else {
        return reply(
            StatusCode::CONFLICT,
            "Title / Username / Community name is not provided",
        );
    };

    let mut scope = state.scope();
    let community = executor::fetch_one(
        &mut scope,
        &Statement::new("SELECT community_id FROM community WHERE community_name = ?")
            .bind(community_name.clone()),
    );

    // The vote counter row goes first so the post can link it through
    // MAX(vote_id); the rowid read last so the Location header can point
    // at the new post.
    let mut batch = Batch::new()
        .with(Statement::new("INSERT INTO votes (upvotes, downvotes) VALUES (0, 0)"));
    match community {
        Ok(Some(row)) => {
            let Some(Value::Integer(community_id)) = row.get("community_id").cloned() else {
                return not_found();
            };
            batch.push(
                Statement::new(
                    "INSERT INTO posts (community_id, title, description, resource_url, \
                     username, vote_id) \
                     VALUES (?, ?, ?, ?, ?, (SELECT MAX(vote_id) FROM votes))",
                )
                .bind(community_id)
                .bind(title)
                .bind(body.description)
                .bind(body.resource_url)
                .bind(username),
            );
        },
        Ok(None) => {
            batch.push(
                Statement::new("INSERT INTO community (community_name) VALUES (?)")
                    .bind(community_name.clone()),
            );
            batch.push(
                Statement::new(
                    "INSERT INTO posts (community_id, title, description, resource_url, \
                     username, vote_id) \
                     VALUES ((SELECT community_id FROM community WHERE community_name = ?), \
                     ?, ?, ?, ?, (SELECT MAX(vote_id) FROM votes))",
                )
                .bind(community_name)
                .bind(title)
                .bind(body.description)
                .bind(body.resource_url)
                .bind(username),
            );
        },
        Err(e) => return failure(&e),
    }
    batch.push(Statement::new("SELECT last_insert_rowid() AS post_id"));

    match transaction::apply_returning(&mut scope, &batch) {
        Ok(results) => created_at(results.last().and_then(|rowid| rowid.first())),
        Err(e) => failure(&e),
    }
}

/// Builds the 201 response for a fresh post, pointing `Location` at the
/// lookup route when the batch yielded the new rowid.
fn created_at(rowid: Option<&crate::db::Row>) -> Response {
    let mut response = reply(StatusCode::CREATED, "Post created");
    if let Some(Value::Integer(post_id)) = rowid.and_then(|row| row.get("post_id")) {
        if let Ok(location) = HeaderValue::from_str(&format!("/posts/get?post_id={post_id}")) {
            response.headers_mut().insert(header::LOCATION, location);
        }
    }
    response
}

async fn delete_post(
    State(state): State<AppState>,
    Query(params): Query<PostIdParams>,
) -> Response {
    let Some(post_id) = params.post_id else {
        return reply(StatusCode::CONFLICT, "Post id is not provided");
    };
    let Some(post_id) = parse_id(&post_id) else {
        return reply(StatusCode::NOT_FOUND, "Post does not exist");
    };

    let mut scope = state.scope();
    let existing = executor::fetch_one(
        &mut scope,
        &Statement::new("SELECT post_id FROM posts WHERE post_id = ?").bind(post_id),
    );
    match existing {
        Ok(Some(_)) => {},
        Ok(None) => return reply(StatusCode::NOT_FOUND, "Post does not exist"),
        Err(e) => return failure(&e),
    }

    // The vote row must go before the post row that references it
    let batch = Batch::new()
        .with(
            Statement::new(
                "DELETE FROM votes WHERE vote_id = \
                 (SELECT vote_id FROM posts WHERE post_id = ?)",
            )
            .bind(post_id),
        )
        .with(Statement::new("DELETE FROM posts WHERE post_id = ?").bind(post_id));

    match transaction::apply(&mut scope, &batch) {
        Ok(()) => {
            tracing::debug!(post_id, "Post deleted");
            reply(StatusCode::OK, "Post deleted")
        },
        Err(e) => failure(&e),
    }
}
