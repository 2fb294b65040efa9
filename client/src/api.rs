use std::time::Duration;

use async_trait::async_trait;
use daily_puzzle_core::wire::{LedgerEntry, ScoreSubmission, SyncRequest, SyncResponse};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ClientError, Result},
    session::Session,
};

/// The score service as the client sees it
#[async_trait]
pub trait ScoreApi: Send + Sync {
    async fn login(&self, email: &str, provider: &str, name: Option<&str>) -> Result<Session>;

    /// Upload queued scores; one result per submission.
    async fn sync_scores(&self, token: &str, scores: &[ScoreSubmission]) -> Result<SyncResponse>;

    /// Every score the server holds for the user.
    async fn fetch_history(&self, token: &str) -> Result<Vec<LedgerEntry>>;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    provider: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: LoginUser,
}

#[derive(Debug, Deserialize)]
struct LoginUser {
    id: Uuid,
    email: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpScoreApi {
    client: Client,
    base_url: String,
}

impl HttpScoreApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        // 401 (no token) and 403 (bad or expired token) both mean log in again
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::Unauthorized);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ScoreApi for HttpScoreApi {
    async fn login(&self, email: &str, provider: &str, name: Option<&str>) -> Result<Session> {
        let body = LoginRequest {
            email,
            provider,
            name,
        };
        let response: LoginResponse = self
            .send(self.client.post(self.url("/auth/login")).json(&body))
            .await?;
        tracing::info!("Logged in as {}", response.user.email);

        Ok(Session {
            user_id: response.user.id,
            email: response.user.email,
            name: response.user.name,
            token: response.token,
        })
    }

    async fn sync_scores(&self, token: &str, scores: &[ScoreSubmission]) -> Result<SyncResponse> {
        let body = SyncRequest {
            scores: scores.to_vec(),
        };
        self.send(
            self.client
                .post(self.url("/score/sync"))
                .bearer_auth(token)
                .json(&body),
        )
        .await
    }

    async fn fetch_history(&self, token: &str) -> Result<Vec<LedgerEntry>> {
        self.send(self.client.get(self.url("/user/heatmap")).bearer_auth(token))
            .await
    }
}
