use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use super::{ApiError, bad_request};
use crate::{
    AppState,
    models::{PresignedUrlRequest, PresignedUrlResponse},
    storage::is_allowed_cover_type,
};

/// get_presigned_cover_url
///
/// [Admin Route] Issues a short-lived URL for uploading a cover image
/// directly to object storage, so the image bytes never pass through this
/// server. The MIME type is checked against the image allowlist before any
/// URL is signed, and the resulting key goes into the book's `cover` field.
#[utoipa::path(
    post,
    path = "/admin/upload/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "Upload URL", body = PresignedUrlResponse),
        (status = 400, description = "Not an image type")
    )
)]
pub async fn get_presigned_cover_url(
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, ApiError> {
    if !is_allowed_cover_type(&payload.file_type) {
        return Err(bad_request("cover uploads must be an image type"));
    }

    // Object key: covers/UUID.ext, with the extension taken from the
    // client's filename.
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("img");
    let object_key = format!("covers/{}.{}", Uuid::new_v4(), extension);

    match state
        .storage
        .presigned_cover_upload(&object_key, &payload.file_type)
        .await
    {
        Ok(url) => Ok(Json(PresignedUrlResponse {
            upload_url: url,
            resource_key: object_key,
        })),
        Err(e) => {
            tracing::error!("storage error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "could not create upload URL" })),
            ))
        }
    }
}
