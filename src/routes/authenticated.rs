use crate::{AppState, handlers};
use axum::{Router, routing::get, routing::post};

/// Authenticated Router Module
///
/// Catalog browsing for any signed-in reader. The auth middleware layered
/// above this module guarantees every handler receives a resolved `AuthUser`,
/// and each handler passes that user's level into the repository, where the
/// `level <= viewer level` restriction is applied unconditionally.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /
        // Home feed: the twelve most recently cataloged visible books.
        .route("/", get(handlers::books::home_feed))
        // POST /logout
        // Stateless session teardown acknowledgement.
        .route("/logout", post(handlers::auth::logout))
        // GET /me
        // The requesting user's own profile.
        .route("/me", get(handlers::auth::get_me))
        // --- Books ---
        // GET /books?title=...&min_words=...&max_words=...&page=...
        .route("/books", get(handlers::books::list_books))
        // GET /books/levels/{level}
        // Level-bucketed view; a level above the requester's own is 404.
        .route("/books/levels/{level}", get(handlers::books::books_by_level))
        // GET /books/wordcount/{bucket}
        // Word-count-bucketed view: short | medium | long | epic.
        .route(
            "/books/wordcount/{bucket}",
            get(handlers::books::books_by_wordcount),
        )
        // GET /books/{id}
        // Detail view with author/series/publisher/tag names resolved.
        .route("/books/{id}", get(handlers::books::get_book))
        // --- Facets ---
        // Listing plus detail (facet + its visible books) per facet type.
        .route("/authors", get(handlers::facets::list_authors))
        .route("/authors/{id}", get(handlers::facets::get_author))
        .route("/series", get(handlers::facets::list_series))
        .route("/series/{id}", get(handlers::facets::get_series))
        .route("/tags", get(handlers::facets::list_tags))
        .route("/tags/{id}", get(handlers::facets::get_tag))
        .route("/publishers", get(handlers::facets::list_publishers))
        .route("/publishers/{id}", get(handlers::facets::get_publisher))
}
