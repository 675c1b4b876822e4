use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{ApiError, bad_request, db_error, not_found};
use crate::{
    AppState,
    auth::{self, ROLE_ADMIN, ROLE_MEMBER},
    models::{
        CatalogStats, CreateUserRequest, DEFAULT_LEVEL, NewUser, UpdateUserRequest, UserProfile,
    },
};

/// Username and password length floors, carried over from the original
/// registration rules.
const MIN_USERNAME_LEN: usize = 5;
const MIN_PASSWORD_LEN: usize = 7;

fn valid_role(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_MEMBER
}

/// list_users
///
/// [Admin Route] Every account, as safe profiles.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All accounts", body = [UserProfile]))
)]
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<UserProfile>> {
    let users = state.repo.list_users().await;
    Json(users.into_iter().map(UserProfile::from).collect())
}

/// create_user
///
/// [Admin Route] Provisions an account. User creation is admin-only; the
/// historically unguarded registration endpoint is not reproduced. The
/// password is hashed before it reaches the repository and the plaintext is
/// dropped here.
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = UserProfile),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    if payload.username.trim().len() < MIN_USERNAME_LEN {
        return Err(bad_request("username is too short"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(bad_request("password is too short"));
    }
    let role = payload.role.unwrap_or_else(|| ROLE_MEMBER.to_string());
    if !valid_role(&role) {
        return Err(bad_request("unknown role"));
    }

    let password_hash = auth::hash_password(&payload.password).map_err(|e| {
        tracing::error!("password hashing error: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "could not create user" })),
        )
    })?;

    let new_user = NewUser {
        name: payload.name,
        username: payload.username.trim().to_string(),
        role,
        level: payload.level.unwrap_or(DEFAULT_LEVEL),
        password_hash,
    };

    match state.repo.create_user(new_user).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user.into()))),
        // Unique-username violations surface as 409 here.
        Err(e) => Err(db_error("create user", e)),
    }
}

/// update_user
///
/// [Admin Route] Partial account update (name, username, level, role).
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserProfile),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if let Some(ref username) = payload.username {
        if username.trim().len() < MIN_USERNAME_LEN {
            return Err(bad_request("username is too short"));
        }
    }
    if let Some(ref role) = payload.role {
        if !valid_role(role) {
            return Err(bad_request("unknown role"));
        }
    }

    match state.repo.update_user(id, payload).await {
        Ok(Some(user)) => Ok(Json(user.into())),
        Ok(None) => Err(not_found()),
        Err(e) => Err(db_error("update user", e)),
    }
}

/// delete_user
///
/// [Admin Route] Removes an account.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.repo.delete_user(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found()),
        Err(e) => Err(db_error("delete user", e)),
    }
}

/// get_stats
///
/// [Admin Route] Row counts for the dashboard.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Catalog stats", body = CatalogStats))
)]
pub async fn get_stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(state.repo.catalog_stats().await)
}
