use crate::{auth, db, error::ApiError, models::User, AppState};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Longest accepted display name
pub const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub provider: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    /// JWT for the other API calls
    pub token: String,
    pub user: User,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub provider: String,
    pub name: Option<String>,
}

impl LoginRequest {
    /// Trim and check the login payload; email and provider are required.
    pub fn credentials(self) -> Result<Credentials, ApiError> {
        let required = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let (Some(email), Some(provider)) = (required(self.email), required(self.provider)) else {
            return Err(ApiError::BadRequest(
                "Email and provider are required".to_string(),
            ));
        };
        if !email.contains('@') {
            return Err(ApiError::BadRequest("Email is not valid".to_string()));
        }
        let name = required(self.name).map(|n| n.chars().take(MAX_NAME_LEN).collect());
        Ok(Credentials {
            email: email.to_lowercase(),
            provider: provider.to_lowercase(),
            name,
        })
    }
}

/// Log a user in by email, creating the account on first use
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials = payload.credentials()?;

    let user = db::queries::find_or_create_user(
        &state.db,
        &credentials.email,
        &credentials.provider,
        credentials.name.as_deref(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to find or create user: {}", e);
        ApiError::Internal("Login failed".to_string())
    })?;

    let token = auth::generate_token(
        user.id,
        &user.email,
        &state.config.security.jwt_secret,
        state.config.security.token_ttl_days,
    )
    .map_err(|e| {
        tracing::error!("Failed to generate JWT token: {}", e);
        ApiError::Internal("Login failed".to_string())
    })?;

    tracing::info!("User logged in: {} (ID: {})", user.display_name(), user.id);

    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
        user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: Option<&str>, provider: Option<&str>, name: Option<&str>) -> LoginRequest {
        LoginRequest {
            email: email.map(String::from),
            provider: provider.map(String::from),
            name: name.map(String::from),
        }
    }

    #[test]
    fn test_credentials_are_normalized() {
        let creds = request(Some(" Ada@Example.com "), Some("Google"), Some("  Ada "))
            .credentials()
            .unwrap();
        assert_eq!(
            creds,
            Credentials {
                email: "ada@example.com".to_string(),
                provider: "google".to_string(),
                name: Some("Ada".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_fields_rejected() {
        for req in [
            request(None, Some("google"), None),
            request(Some("a@b.c"), None, None),
            request(Some("   "), Some("google"), None),
        ] {
            let err = req.credentials().unwrap_err();
            assert_eq!(err.to_string(), "Email and provider are required");
        }
    }

    #[test]
    fn test_blank_name_becomes_none() {
        let creds = request(Some("a@b.c"), Some("google"), Some("  "))
            .credentials()
            .unwrap();
        assert_eq!(creds.name, None);
    }

    #[test]
    fn test_login_request_deserialization() {
        let json = r#"{"email":"a@b.c","provider":"google"}"#;
        let req: LoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.email.as_deref(), Some("a@b.c"));
        assert!(req.name.is_none());
    }
}
