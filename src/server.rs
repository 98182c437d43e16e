//! HTTP server assembly.
//!
//! One axum app hosts all four services under their path prefixes. State
//! is just the database path; every request that touches storage opens
//! its own [`ConnectionScope`] and releases it before the response goes
//! out.

use crate::config::AgoraConfig;
use crate::db::ConnectionScope;
use crate::services;
use crate::{Error, Result};
use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Shared router state.
#[derive(Debug, Clone)]
pub struct AppState {
    database: Arc<PathBuf>,
}

impl AppState {
    /// Creates state pointing at the given database file.
    #[must_use]
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: Arc::new(database.into()),
        }
    }

    /// Opens a fresh connection scope for one request.
    #[must_use]
    pub fn scope(&self) -> ConnectionScope {
        ConnectionScope::new(self.database.as_path())
    }
}

/// Builds the full application router.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .nest("/users", services::users::router())
        .nest("/posts", services::posts::router())
        .nest("/votes", services::votes::router())
        .nest("/messages", services::messages::router())
        .fallback(fallback)
        // Security headers (OWASP recommendations)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until ctrl-c.
///
/// # Errors
///
/// Returns an error if the database file does not exist, the address
/// cannot be bound, or the server fails while running.
pub async fn serve(config: &AgoraConfig) -> Result<()> {
    if !config.database.exists() {
        return Err(Error::OperationFailed {
            operation: "serve".to_string(),
            cause: format!(
                "database {} does not exist, run `agora init` first",
                config.database.display()
            ),
        });
    }

    let app = app(AppState::new(config.database.clone()));

    let listener = tokio::net::TcpListener::bind((config.bind.as_str(), config.port))
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "bind".to_string(),
            cause: format!("{}:{}: {e}", config.bind, config.port),
        })?;
    let addr = listener.local_addr().map_err(|e| Error::OperationFailed {
        operation: "local_addr".to_string(),
        cause: e.to_string(),
    })?;
    tracing::info!(%addr, database = %config.database.display(), "Starting agora HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::OperationFailed {
            operation: "serve".to_string(),
            cause: e.to_string(),
        })
}

async fn home() -> Response {
    services::reply(StatusCode::OK, "agora is running")
}

async fn fallback() -> Response {
    services::not_found()
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
