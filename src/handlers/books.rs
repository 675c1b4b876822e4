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
    models::{Book, BookDetail, CreateBookRequest, UpdateBookRequest, WordCountBucket},
    repository::{BookQuery, Page},
};

/// Number of books on the home feed.
const HOME_FEED_SIZE: i64 = 12;

/// BookListParams
///
/// Query parameters accepted by the book listing: title substring search,
/// inclusive word-count bounds, pagination.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct BookListParams {
    pub title: Option<String>,
    pub min_words: Option<i32>,
    pub max_words: Option<i32>,
    /// 1-based page number.
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// PageParams
///
/// Pagination-only query parameters for the bucketed views.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// home_feed
///
/// [Authenticated Route] The most recently cataloged books visible at the
/// requesting user's level.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Recent books", body = [Book]))
)]
pub async fn home_feed(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<Book>> {
    Json(state.repo.recent_books(level, HOME_FEED_SIZE).await)
}

/// list_books
///
/// [Authenticated Route] Visible books ordered by title sort key, with
/// optional title search and word-count bounds. The level restriction is
/// applied unconditionally in the repository.
#[utoipa::path(
    get,
    path = "/books",
    params(BookListParams),
    responses((status = 200, description = "Visible books", body = [Book]))
)]
pub async fn list_books(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BookListParams>,
) -> Json<Vec<Book>> {
    let query = BookQuery {
        title: params.title,
        min_words: params.min_words,
        max_words: params.max_words,
        exact_level: None,
    };
    let page = Page {
        page: params.page,
        per_page: params.per_page,
    };
    Json(state.repo.list_books(level, query, page).await)
}

/// get_book
///
/// [Authenticated Route] Detail view with facet names resolved. A book above
/// the requester's level answers 404, exactly like a missing one.
#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Found", body = BookDetail),
        (status = 404, description = "Missing or above the requester's level")
    )
)]
pub async fn get_book(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookDetail>, ApiError> {
    match state.repo.get_book(id, level).await {
        Some(book) => Ok(Json(book)),
        None => Err(not_found()),
    }
}

/// books_by_level
///
/// [Authenticated Route] The level-bucketed view: books of exactly the
/// requested level. Asking for a level above one's own is answered 404, so
/// the shape of higher tiers stays invisible.
#[utoipa::path(
    get,
    path = "/books/levels/{level}",
    params(("level" = i32, Path, description = "Exact reading level")),
    responses(
        (status = 200, description = "Books of that level", body = [Book]),
        (status = 404, description = "Level above the requester's own")
    )
)]
pub async fn books_by_level(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Path(requested): Path<i32>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Book>>, ApiError> {
    if requested > level {
        return Err(not_found());
    }
    let query = BookQuery {
        exact_level: Some(requested),
        ..BookQuery::default()
    };
    let page = Page {
        page: params.page,
        per_page: params.per_page,
    };
    Ok(Json(state.repo.list_books(level, query, page).await))
}

/// books_by_wordcount
///
/// [Authenticated Route] The word-count-bucketed view. Bucket names are
/// `short`, `medium`, `long`, `epic`; anything else is 404.
#[utoipa::path(
    get,
    path = "/books/wordcount/{bucket}",
    params(("bucket" = String, Path, description = "short | medium | long | epic")),
    responses(
        (status = 200, description = "Books in the bucket", body = [Book]),
        (status = 404, description = "Unknown bucket")
    )
)]
pub async fn books_by_wordcount(
    AuthUser { level, .. }: AuthUser,
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let bucket = WordCountBucket::parse(&bucket).ok_or_else(not_found)?;
    let (min_words, max_words) = bucket.word_range();

    let query = BookQuery {
        min_words,
        max_words,
        ..BookQuery::default()
    };
    let page = Page {
        page: params.page,
        per_page: params.per_page,
    };
    Ok(Json(state.repo.list_books(level, query, page).await))
}

/// create_book
///
/// [Admin Route] Catalogs a new book. The sort key is derived from the title
/// when absent and the level defaults to 1.
#[utoipa::path(
    post,
    path = "/admin/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Created", body = Book),
        (status = 409, description = "Constraint violation")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    match state.repo.create_book(payload).await {
        Ok(book) => Ok((StatusCode::CREATED, Json(book))),
        Err(e) => Err(db_error("create book", e)),
    }
}

/// update_book
///
/// [Admin Route] Partial update; `tag_ids`, when present, replaces the full
/// tag set.
#[utoipa::path(
    put,
    path = "/admin/books/{id}",
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Updated", body = Book),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookRequest>,
) -> Result<Json<Book>, ApiError> {
    match state.repo.update_book(id, payload).await {
        Ok(Some(book)) => Ok(Json(book)),
        Ok(None) => Err(not_found()),
        Err(e) => Err(db_error("update book", e)),
    }
}

/// delete_book
///
/// [Admin Route] Removes a book and its tag links.
#[utoipa::path(
    delete,
    path = "/admin/books/{id}",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.repo.delete_book(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found()),
        Err(e) => Err(db_error("delete book", e)),
    }
}
