use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

// Routing segregation: Public, Authenticated, Admin.
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Aggregates every documented route and schema into the OpenAPI document
/// served at `/api-docs/openapi.json` and rendered by the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login, handlers::auth::logout, handlers::auth::get_me,
        handlers::books::home_feed, handlers::books::list_books, handlers::books::get_book,
        handlers::books::books_by_level, handlers::books::books_by_wordcount,
        handlers::books::create_book, handlers::books::update_book, handlers::books::delete_book,
        handlers::facets::list_authors, handlers::facets::get_author,
        handlers::facets::create_author, handlers::facets::update_author,
        handlers::facets::delete_author,
        handlers::facets::list_series, handlers::facets::get_series,
        handlers::facets::create_series, handlers::facets::update_series,
        handlers::facets::delete_series,
        handlers::facets::list_tags, handlers::facets::get_tag,
        handlers::facets::create_tag, handlers::facets::update_tag,
        handlers::facets::delete_tag,
        handlers::facets::list_publishers, handlers::facets::get_publisher,
        handlers::facets::create_publisher, handlers::facets::update_publisher,
        handlers::facets::delete_publisher,
        handlers::users::list_users, handlers::users::create_user,
        handlers::users::update_user, handlers::users::delete_user,
        handlers::users::get_stats,
        handlers::uploads::get_presigned_cover_url
    ),
    components(
        schemas(
            models::UserProfile, models::Book, models::BookDetail,
            models::Author, models::Series, models::Tag, models::Publisher,
            models::AuthorDetail, models::SeriesDetail, models::TagDetail,
            models::PublisherDetail,
            models::LoginRequest, models::LoginResponse,
            models::CreateUserRequest, models::UpdateUserRequest,
            models::CreateBookRequest, models::UpdateBookRequest,
            models::CreateFacetRequest, models::UpdateFacetRequest,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            models::CatalogStats,
        )
    ),
    tags(
        (name = "readshelf", description = "Level-gated library catalog API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for everything a handler needs: repository,
/// storage, and configuration. Cloned per request; all members are cheap
/// handles.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer behind the `Repository` trait.
    pub repo: RepositoryState,
    /// Object storage for cover images.
    pub storage: StorageState,
    /// Immutable environment configuration.
    pub config: AppConfig,
}

// FromRef implementations let extractors pull individual services out of the
// shared state without knowing about the rest.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for the authenticated catalog routes. Extracting `AuthUser` performs
/// the whole authentication flow; a failed extraction rejects the request
/// with 401 before any handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// The single authorization gate for the whole `/admin` subtree. Handlers
/// under it carry no role checks of their own. Non-admin users get 404, not
/// 403, so the admin surface is indistinguishable from a missing route.
async fn admin_middleware(auth_user: AuthUser, request: Request, next: Next) -> Response {
    if !auth_user.is_admin() {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

/// create_router
///
/// Assembles the full routing tree, applies the tiered guards, and layers
/// the observability stack on the outside.
pub fn create_router(state: AppState) -> Router {
    let base_router = Router::new()
        // Swagger UI over the generated OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no guard.
        .merge(public::public_routes())
        // Catalog routes: authentication required.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: the centralized role gate wraps the whole subtree.
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        )
        .with_state(state);

    // Layers wrap inside-out: the last `.layer` call is the outermost. The
    // request id must be generated before the trace span reads it, and the
    // propagation layer echoes it back on the way out.
    let x_request_id = HeaderName::from_static("x-request-id");
    base_router
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(tower_http::LatencyUnit::Millis),
                ),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_methods(Any)
                .allow_origin(Any)
                .allow_headers(Any),
        )
}

/// Per-request tracing span carrying method, URI, and the generated request
/// id, so all log lines of one request correlate.
fn request_span(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
