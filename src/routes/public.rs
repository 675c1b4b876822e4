use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// The only endpoints reachable without a session: the health probe and the
/// login exchange. Everything else in the catalog sits behind
/// authentication, because even a book listing reveals which levels exist.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /login
        // Username + password in, session JWT out.
        .route("/login", post(handlers::auth::login))
}
