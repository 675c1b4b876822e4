//! Request handlers, grouped by concern. Every catalog read resolves the
//! requester through the `AuthUser` extractor and passes its level down to
//! the repository; admin mutations sit behind the router-level guard.

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

pub mod auth;
pub mod books;
pub mod facets;
pub mod uploads;
pub mod users;

/// Uniform error payload: a status plus a small JSON body.
pub(crate) type ApiError = (StatusCode, Json<Value>);

pub(crate) fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

pub(crate) fn unauthorized() -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "invalid credentials" })),
    )
}

pub(crate) fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

/// Maps a database write failure to a response. Constraint violations are the
/// caller's fault and come back as 409; anything else is logged with its
/// cause and surfaced as a generic failure, per the error-handling policy.
pub(crate) fn db_error(context: &'static str, e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "already exists" })),
            );
        }
        if db_err.is_foreign_key_violation() {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "still referenced by other records" })),
            );
        }
    }
    tracing::error!("{} error: {:?}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "database error" })),
    )
}
