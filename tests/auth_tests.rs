//! Login and session-token flow, end to end through the router against the
//! stub repository.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::StubRepository;
use readshelf::{
    MockStorageService,
    models::{LoginResponse, UserProfile},
};
use std::sync::Arc;
use tower::util::ServiceExt;

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header("Content-Type", "application/json")
        .body(Body::from(
            serde_json::json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn login_with_valid_credentials_returns_a_usable_token() {
    let repo = Arc::new(StubRepository::with_fixtures());
    let member = repo.member().clone();
    let app = common::test_app(repo, MockStorageService::new());

    let response = app
        .clone()
        .oneshot(login_request(&member.username, common::MEMBER_PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let login: LoginResponse = body_json(response).await;
    assert!(!login.token.is_empty());
    assert_eq!(login.user.id, member.id);
    assert_eq!(login.user.level, member.level);

    // The token authenticates a catalog request.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("Authorization", format!("Bearer {}", login.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile: UserProfile = body_json(response).await;
    assert_eq!(profile.username, member.username);
}

#[tokio::test]
async fn admin_login_reaches_the_admin_surface() {
    let repo = Arc::new(StubRepository::with_fixtures());
    let admin = repo.admin().clone();
    let app = common::test_app(repo, MockStorageService::new());

    let response = app
        .clone()
        .oneshot(login_request(&admin.username, common::ADMIN_PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let login: LoginResponse = body_json(response).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/stats")
                .header("Authorization", format!("Bearer {}", login.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_and_unknown_username_are_indistinguishable() {
    let repo = Arc::new(StubRepository::with_fixtures());
    let member = repo.member().clone();
    let app = common::test_app(repo, MockStorageService::new());

    let wrong_password = app
        .clone()
        .oneshot(login_request(&member.username, "not-the-password"))
        .await
        .unwrap();
    let unknown_user = app
        .oneshot(login_request("nobody-here", "not-the-password"))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_and_foreign_tokens_are_rejected() {
    let repo = Arc::new(StubRepository::with_fixtures());
    let app = common::test_app(repo, MockStorageService::new());

    for token in [
        "garbage".to_string(),
        // Signed with a secret this app does not use.
        readshelf::auth::issue_token(uuid::Uuid::new_v4(), "some-other-secret").unwrap(),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/books")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn tokens_for_deleted_users_stop_working() {
    let repo = Arc::new(StubRepository::with_fixtures());
    let app = common::test_app(repo, MockStorageService::new());

    // Valid signature, but the subject does not exist in the user table.
    let config = readshelf::AppConfig::default();
    let token = readshelf::auth::issue_token(uuid::Uuid::new_v4(), &config.jwt_secret).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_acknowledges_authenticated_sessions() {
    let repo = Arc::new(StubRepository::with_fixtures());
    let member_id = repo.member().id;
    let app = common::test_app(repo, MockStorageService::new());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header("x-user-id", member_id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
