use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    repository::RepositoryState,
};

/// Role granted mutation rights over the catalog and user accounts.
pub const ROLE_ADMIN: &str = "admin";
/// Default role for regular readers.
pub const ROLE_MEMBER: &str = "member";

/// Session tokens expire a week after issue, matching the cookie lifetime the
/// catalog historically used.
const TOKEN_TTL_DAYS: i64 = 7;

/// Claims
///
/// Payload signed into every session JWT. Only the user id is carried; role
/// and level are re-read from the database on each request so that demotions
/// and level changes take effect without waiting for token expiry.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's UUID.
    pub sub: Uuid,
    /// Expiration time (seconds since epoch).
    pub exp: usize,
    /// Issued-at time (seconds since epoch).
    pub iat: usize,
}

/// Signs a session token for the given user id.
pub fn issue_token(user_id: Uuid, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Hashes a password with argon2id and a fresh random salt, producing a
/// PHC-format string for the `users.password_hash` column.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verifies a password against a stored PHC hash. Malformed hashes verify as
/// false rather than erroring; a corrupt row must not open the account.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// AuthUser
///
/// The resolved identity of an authenticated request: everything the
/// handlers need for the two access checks. `level` feeds the visibility
/// filter on every catalog query; `role` feeds the admin gate.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
    pub level: i32,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// AuthUser Extractor
///
/// Implements `FromRequestParts` so any handler can take `AuthUser` as an
/// argument. Resolution order:
/// 1. Local-only bypass: an `x-user-id` header naming an existing user.
/// 2. Bearer token: JWT decode, then a database lookup by `sub`.
///
/// The lookup runs on every request; a deleted user holding a still-valid
/// token is rejected immediately. Rejection is always 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Development bypass, guarded by the environment check.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        // The id must map to a real row so role and level are
                        // the ones the database would grant.
                        if let Some(user) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                role: user.role,
                                level: user.level,
                            });
                        }
                    }
                }
            }
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let user = repo
            .get_user(token_data.claims.sub)
            .await
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
            level: user.level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert_ne!(hash, "correct horse battery");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn two_hashes_of_the_same_password_differ() {
        // Fresh salt per hash.
        let first = hash_password("swordfish").unwrap();
        let second = hash_password("swordfish").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("swordfish", &first));
        assert!(verify_password("swordfish", &second));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn issued_tokens_decode_with_the_same_secret() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "test-secret").unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, user_id);
        assert!(decoded.claims.exp > decoded.claims.iat);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = issue_token(Uuid::new_v4(), "secret-a").unwrap();

        let err = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret-b"),
            &Validation::default(),
        )
        .unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }
}
