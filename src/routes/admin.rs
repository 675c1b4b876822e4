use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Every mutating route in the system lives here, nested under `/admin`. The
/// whole subtree is wrapped by the admin guard middleware in `create_router`;
/// the handlers themselves contain no role checks. Non-admin requests never
/// reach them and are answered with 404 so the admin surface stays
/// undiscoverable.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Row counts per entity for the dashboard.
        .route("/stats", get(handlers::users::get_stats))
        // --- Accounts ---
        // GET lists every account; POST provisions one (this is the only
        // registration path, there is no open signup).
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/{id}",
            put(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        // --- Catalog entities ---
        .route("/books", post(handlers::books::create_book))
        .route(
            "/books/{id}",
            put(handlers::books::update_book).delete(handlers::books::delete_book),
        )
        .route("/authors", post(handlers::facets::create_author))
        .route(
            "/authors/{id}",
            put(handlers::facets::update_author).delete(handlers::facets::delete_author),
        )
        .route("/series", post(handlers::facets::create_series))
        .route(
            "/series/{id}",
            put(handlers::facets::update_series).delete(handlers::facets::delete_series),
        )
        .route("/tags", post(handlers::facets::create_tag))
        .route(
            "/tags/{id}",
            put(handlers::facets::update_tag).delete(handlers::facets::delete_tag),
        )
        .route("/publishers", post(handlers::facets::create_publisher))
        .route(
            "/publishers/{id}",
            put(handlers::facets::update_publisher).delete(handlers::facets::delete_publisher),
        )
        // --- Cover upload pipeline ---
        // POST /admin/upload/presigned
        // Short-lived direct-to-storage PUT URL for cover images.
        .route(
            "/upload/presigned",
            post(handlers::uploads::get_presigned_cover_url),
        )
}
