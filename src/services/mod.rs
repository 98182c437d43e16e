//! HTTP service handlers.
//!
//! Each submodule owns one router that the server nests under its path
//! prefix. Handlers validate parameters, run their statements through a
//! request-scoped [`ConnectionScope`](crate::ConnectionScope), and answer
//! with either raw rows or the shared status envelope.

pub mod messages;
pub mod posts;
pub mod users;
pub mod votes;

use crate::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON body shared by every non-row response:
/// `{"status_code": "201", "message": "Post created"}`.
#[derive(Debug, Serialize)]
pub struct Envelope {
    status_code: String,
    message: String,
}

/// Builds an envelope response with the given status.
pub(crate) fn reply(status: StatusCode, message: &str) -> Response {
    metrics::counter!(
        "agora_responses_total",
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    (
        status,
        Json(Envelope {
            status_code: status.as_u16().to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// The catch-all 404 envelope, shared by unknown routes and absent rows.
pub(crate) fn not_found() -> Response {
    reply(StatusCode::NOT_FOUND, "Resource not found")
}

/// Parses a numeric identifier supplied as query-string text.
///
/// Query extractors keep ids as text so a malformed value stays inside
/// the shared envelope flow instead of tripping the extractor's bare
/// 400. `None` from here can never match an integer key, so callers
/// treat it exactly like an unknown id.
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Returns raw rows (an object or array of objects) as a 200 response.
pub(crate) fn rows(payload: &impl Serialize) -> Response {
    metrics::counter!("agora_responses_total", "status" => "200").increment(1);
    (StatusCode::OK, Json(payload)).into_response()
}

/// Maps a data-layer error onto a response. Contract violations are bugs
/// in the handler and surface as 500; storage failures follow the
/// not-found envelope.
pub(crate) fn failure(error: &Error) -> Response {
    match error {
        Error::BatchMismatch { .. } => {
            tracing::error!(error = %error, "Malformed statement batch");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        },
        Error::StatementFailed { .. } | Error::OperationFailed { .. } => {
            tracing::debug!(error = %error, "Storage operation failed");
            not_found()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_maps_contract_violations_to_500() {
        let response = failure(&Error::BatchMismatch {
            statements: 2,
            argument_lists: 3,
        });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_id_accepts_numeric_text_only() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id(" 42 "), Some(42));
        assert_eq!(parse_id("-1"), Some(-1));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("4.2"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn test_failure_maps_storage_errors_to_404() {
        let response = failure(&Error::StatementFailed {
            operation: "execute".to_string(),
            cause: "UNIQUE constraint failed".to_string(),
        });
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
