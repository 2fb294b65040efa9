use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,   // User ID (uuid)
    pub email: String, // Login email
    pub exp: usize,    // Expiration time
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Extractor for authenticated users from JWT tokens.
///
/// A missing bearer token rejects with 401, a bad or expired one with 403.
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = Arc::<AppState>::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(String::from);

        async move {
            let token = token.ok_or(ApiError::Unauthorized)?;
            verify_token(&token, &app_state.config.security.jwt_secret)
        }
    }
}

pub fn verify_token(token: &str, jwt_secret: &str) -> Result<AuthenticatedUser, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        ApiError::Forbidden
    })?;

    let user_id = token_data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| ApiError::Forbidden)?;

    Ok(AuthenticatedUser {
        user_id,
        email: token_data.claims.email,
    })
}

/// Generate a JWT token for a user
pub fn generate_token(
    user_id: Uuid,
    email: &str,
    jwt_secret: &str,
    ttl_days: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = (chrono::Utc::now() + chrono::Duration::days(ttl_days)).timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: expiration.max(0) as usize,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-value";

    #[test]
    fn test_token_round_trip() {
        let id = Uuid::new_v4();
        let token = generate_token(id, "a@example.com", SECRET, 7).unwrap();
        let user = verify_token(&token, SECRET).unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.email, "a@example.com");
    }

    #[test]
    fn test_wrong_secret_is_forbidden() {
        let token = generate_token(Uuid::new_v4(), "a@example.com", SECRET, 7).unwrap();
        assert!(matches!(
            verify_token(&token, "another-secret"),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn test_expired_token_is_forbidden() {
        let token = generate_token(Uuid::new_v4(), "a@example.com", SECRET, -2).unwrap();
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn test_non_uuid_subject_is_forbidden() {
        let claims = Claims {
            sub: "42".to_string(),
            email: "a@example.com".to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap();
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(ApiError::Forbidden)
        ));
    }
}
