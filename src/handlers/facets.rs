//! Handlers for the four name+level facets (authors, series, tags,
//! publishers). Each facet carries the same route set: a filtered listing, a
//! detail view joined with its visible books, and the three admin mutations.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, db_error, not_found};
use crate::{
    AppState,
    auth::AuthUser,
    models::{
        Author, AuthorDetail, CreateFacetRequest, Publisher, PublisherDetail, Series,
        SeriesDetail, Tag, TagDetail, UpdateFacetRequest,
    },
    repository::Page,
};

/// FacetListParams
///
/// Query parameters shared by all facet listings: a case-insensitive name
/// substring filter and pagination.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct FacetListParams {
    pub name: Option<String>,
    /// 1-based page number.
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl FacetListParams {
    fn page(&self) -> Page {
        Page {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

// --- Authors ---

/// list_authors
///
/// [Authenticated Route] Visible authors ordered by name.
#[utoipa::path(
    get,
    path = "/authors",
    params(FacetListParams),
    responses((status = 200, description = "Visible authors", body = [Author]))
)]
pub async fn list_authors(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<FacetListParams>,
) -> Json<Vec<Author>> {
    let page = params.page();
    Json(state.repo.list_authors(level, params.name, page).await)
}

/// get_author
///
/// [Authenticated Route] Author detail plus their visible books, ordered by
/// title sort key. Both the author row and the book list are level-gated.
#[utoipa::path(
    get,
    path = "/authors/{id}",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Found", body = AuthorDetail),
        (status = 404, description = "Missing or above the requester's level")
    )
)]
pub async fn get_author(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuthorDetail>, ApiError> {
    let author = state
        .repo
        .get_author(id, level)
        .await
        .ok_or_else(not_found)?;
    let books = state.repo.books_by_author(id, level).await;
    Ok(Json(AuthorDetail { author, books }))
}

/// create_author
///
/// [Admin Route]
#[utoipa::path(
    post,
    path = "/admin/authors",
    request_body = CreateFacetRequest,
    responses((status = 201, description = "Created", body = Author))
)]
pub async fn create_author(
    State(state): State<AppState>,
    Json(payload): Json<CreateFacetRequest>,
) -> Result<(StatusCode, Json<Author>), ApiError> {
    match state.repo.create_author(payload).await {
        Ok(author) => Ok((StatusCode::CREATED, Json(author))),
        Err(e) => Err(db_error("create author", e)),
    }
}

/// update_author
///
/// [Admin Route]
#[utoipa::path(
    put,
    path = "/admin/authors/{id}",
    params(("id" = Uuid, Path, description = "Author ID")),
    request_body = UpdateFacetRequest,
    responses(
        (status = 200, description = "Updated", body = Author),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFacetRequest>,
) -> Result<Json<Author>, ApiError> {
    match state.repo.update_author(id, payload).await {
        Ok(Some(author)) => Ok(Json(author)),
        Ok(None) => Err(not_found()),
        Err(e) => Err(db_error("update author", e)),
    }
}

/// delete_author
///
/// [Admin Route] Refused with 409 while books still reference the author.
#[utoipa::path(
    delete,
    path = "/admin/authors/{id}",
    params(("id" = Uuid, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Author still has books")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.repo.delete_author(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found()),
        Err(e) => Err(db_error("delete author", e)),
    }
}

// --- Series ---

/// list_series
///
/// [Authenticated Route] Visible series ordered by name.
#[utoipa::path(
    get,
    path = "/series",
    params(FacetListParams),
    responses((status = 200, description = "Visible series", body = [Series]))
)]
pub async fn list_series(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<FacetListParams>,
) -> Json<Vec<Series>> {
    let page = params.page();
    Json(state.repo.list_series(level, params.name, page).await)
}

/// get_series
///
/// [Authenticated Route] Series detail plus its visible books in
/// `series_index` order.
#[utoipa::path(
    get,
    path = "/series/{id}",
    params(("id" = Uuid, Path, description = "Series ID")),
    responses(
        (status = 200, description = "Found", body = SeriesDetail),
        (status = 404, description = "Missing or above the requester's level")
    )
)]
pub async fn get_series(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SeriesDetail>, ApiError> {
    let series = state
        .repo
        .get_series(id, level)
        .await
        .ok_or_else(not_found)?;
    let books = state.repo.books_in_series(id, level).await;
    Ok(Json(SeriesDetail { series, books }))
}

/// create_series
///
/// [Admin Route]
#[utoipa::path(
    post,
    path = "/admin/series",
    request_body = CreateFacetRequest,
    responses((status = 201, description = "Created", body = Series))
)]
pub async fn create_series(
    State(state): State<AppState>,
    Json(payload): Json<CreateFacetRequest>,
) -> Result<(StatusCode, Json<Series>), ApiError> {
    match state.repo.create_series(payload).await {
        Ok(series) => Ok((StatusCode::CREATED, Json(series))),
        Err(e) => Err(db_error("create series", e)),
    }
}

/// update_series
///
/// [Admin Route]
#[utoipa::path(
    put,
    path = "/admin/series/{id}",
    params(("id" = Uuid, Path, description = "Series ID")),
    request_body = UpdateFacetRequest,
    responses(
        (status = 200, description = "Updated", body = Series),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_series(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFacetRequest>,
) -> Result<Json<Series>, ApiError> {
    match state.repo.update_series(id, payload).await {
        Ok(Some(series)) => Ok(Json(series)),
        Ok(None) => Err(not_found()),
        Err(e) => Err(db_error("update series", e)),
    }
}

/// delete_series
///
/// [Admin Route] Refused with 409 while the series still has books.
#[utoipa::path(
    delete,
    path = "/admin/series/{id}",
    params(("id" = Uuid, Path, description = "Series ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Series still has books")
    )
)]
pub async fn delete_series(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.repo.delete_series(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found()),
        Err(e) => Err(db_error("delete series", e)),
    }
}

// --- Tags ---

/// list_tags
///
/// [Authenticated Route] Visible tags ordered by name.
#[utoipa::path(
    get,
    path = "/tags",
    params(FacetListParams),
    responses((status = 200, description = "Visible tags", body = [Tag]))
)]
pub async fn list_tags(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<FacetListParams>,
) -> Json<Vec<Tag>> {
    let page = params.page();
    Json(state.repo.list_tags(level, params.name, page).await)
}

/// get_tag
///
/// [Authenticated Route] Tag detail plus the visible books carrying it.
#[utoipa::path(
    get,
    path = "/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Found", body = TagDetail),
        (status = 404, description = "Missing or above the requester's level")
    )
)]
pub async fn get_tag(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TagDetail>, ApiError> {
    let tag = state.repo.get_tag(id, level).await.ok_or_else(not_found)?;
    let books = state.repo.books_with_tag(id, level).await;
    Ok(Json(TagDetail { tag, books }))
}

/// create_tag
///
/// [Admin Route]
#[utoipa::path(
    post,
    path = "/admin/tags",
    request_body = CreateFacetRequest,
    responses((status = 201, description = "Created", body = Tag))
)]
pub async fn create_tag(
    State(state): State<AppState>,
    Json(payload): Json<CreateFacetRequest>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    match state.repo.create_tag(payload).await {
        Ok(tag) => Ok((StatusCode::CREATED, Json(tag))),
        Err(e) => Err(db_error("create tag", e)),
    }
}

/// update_tag
///
/// [Admin Route]
#[utoipa::path(
    put,
    path = "/admin/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    request_body = UpdateFacetRequest,
    responses(
        (status = 200, description = "Updated", body = Tag),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFacetRequest>,
) -> Result<Json<Tag>, ApiError> {
    match state.repo.update_tag(id, payload).await {
        Ok(Some(tag)) => Ok(Json(tag)),
        Ok(None) => Err(not_found()),
        Err(e) => Err(db_error("update tag", e)),
    }
}

/// delete_tag
///
/// [Admin Route] Refused with 409 while books still carry the tag.
#[utoipa::path(
    delete,
    path = "/admin/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Tag still in use")
    )
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.repo.delete_tag(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found()),
        Err(e) => Err(db_error("delete tag", e)),
    }
}

// --- Publishers ---

/// list_publishers
///
/// [Authenticated Route] Visible publishers ordered by name.
#[utoipa::path(
    get,
    path = "/publishers",
    params(FacetListParams),
    responses((status = 200, description = "Visible publishers", body = [Publisher]))
)]
pub async fn list_publishers(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<FacetListParams>,
) -> Json<Vec<Publisher>> {
    let page = params.page();
    Json(state.repo.list_publishers(level, params.name, page).await)
}

/// get_publisher
///
/// [Authenticated Route] Publisher detail plus its visible books.
#[utoipa::path(
    get,
    path = "/publishers/{id}",
    params(("id" = Uuid, Path, description = "Publisher ID")),
    responses(
        (status = 200, description = "Found", body = PublisherDetail),
        (status = 404, description = "Missing or above the requester's level")
    )
)]
pub async fn get_publisher(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublisherDetail>, ApiError> {
    let publisher = state
        .repo
        .get_publisher(id, level)
        .await
        .ok_or_else(not_found)?;
    let books = state.repo.books_by_publisher(id, level).await;
    Ok(Json(PublisherDetail { publisher, books }))
}

/// create_publisher
///
/// [Admin Route]
#[utoipa::path(
    post,
    path = "/admin/publishers",
    request_body = CreateFacetRequest,
    responses((status = 201, description = "Created", body = Publisher))
)]
pub async fn create_publisher(
    State(state): State<AppState>,
    Json(payload): Json<CreateFacetRequest>,
) -> Result<(StatusCode, Json<Publisher>), ApiError> {
    match state.repo.create_publisher(payload).await {
        Ok(publisher) => Ok((StatusCode::CREATED, Json(publisher))),
        Err(e) => Err(db_error("create publisher", e)),
    }
}

/// update_publisher
///
/// [Admin Route]
#[utoipa::path(
    put,
    path = "/admin/publishers/{id}",
    params(("id" = Uuid, Path, description = "Publisher ID")),
    request_body = UpdateFacetRequest,
    responses(
        (status = 200, description = "Updated", body = Publisher),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_publisher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFacetRequest>,
) -> Result<Json<Publisher>, ApiError> {
    match state.repo.update_publisher(id, payload).await {
        Ok(Some(publisher)) => Ok(Json(publisher)),
        Ok(None) => Err(not_found()),
        Err(e) => Err(db_error("update publisher", e)),
    }
}

/// delete_publisher
///
/// [Admin Route] Refused with 409 while books still reference the publisher.
#[utoipa::path(
    delete,
    path = "/admin/publishers/{id}",
    params(("id" = Uuid, Path, description = "Publisher ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Publisher still has books")
    )
)]
pub async fn delete_publisher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.repo.delete_publisher(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found()),
        Err(e) => Err(db_error("delete publisher", e)),
    }
}
