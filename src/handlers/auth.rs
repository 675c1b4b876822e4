use axum::{Json, extract::State, http::StatusCode};

use super::{ApiError, unauthorized};
use crate::{
    AppState,
    auth::{self, AuthUser},
    models::{LoginRequest, LoginResponse, UserProfile},
};

/// login
///
/// [Public Route] Exchanges username + password for a session token.
///
/// A missing user and a wrong password produce the same 401; the endpoint
/// must not reveal which usernames exist.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .repo
        .get_user_by_username(&payload.username)
        .await
        .ok_or_else(unauthorized)?;

    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(unauthorized());
    }

    let token = auth::issue_token(user.id, &state.config.jwt_secret).map_err(|e| {
        tracing::error!("token signing error: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "login failed" })),
        )
    })?;

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// logout
///
/// [Authenticated Route] Stateless acknowledgement; the session token lives
/// client-side and is simply discarded there.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout(_auth: AuthUser) -> StatusCode {
    StatusCode::NO_CONTENT
}

/// get_me
///
/// [Authenticated Route] The requesting user's profile, re-read from the
/// database so recent level or role changes are reflected.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state.repo.get_user(id).await.ok_or_else(super::not_found)?;
    Ok(Json(user.into()))
}
