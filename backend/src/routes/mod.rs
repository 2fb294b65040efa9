pub mod auth;
pub mod health;
pub mod leaderboard;
pub mod puzzles;
pub mod scores;
pub mod users;

use std::sync::Arc;

use axum::{
    http::{header, Method, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    rate_limit::{self, RateLimits},
    AppState,
};

/// The server's calendar day
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Full application: routes, rate limits, CORS and request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    // Credentials are allowed, so the origin is mirrored instead of `*`
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    create_routes(&state.limits)
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn create_routes(limits: &RateLimits) -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes(limits))
}

fn api_routes(limits: &RateLimits) -> Router<Arc<AppState>> {
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .layer(from_fn_with_state(limits.auth.clone(), rate_limit::enforce));

    let score_routes = Router::new()
        .route("/submit", post(scores::submit_score))
        .layer(from_fn_with_state(
            limits.score_submit.clone(),
            rate_limit::enforce,
        ))
        .route("/sync", post(scores::sync_scores));

    let user_routes = Router::new()
        .route("/profile", get(users::get_profile).put(users::update_profile))
        .route("/scores", get(users::score_history))
        .route("/heatmap", get(users::heatmap))
        .route("/stats", get(users::stats));

    let leaderboard_routes = Router::new()
        .route("/daily", get(leaderboard::daily))
        .route("/weekly", get(leaderboard::weekly))
        .route("/all-time", get(leaderboard::all_time));

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/score", score_routes)
        .nest("/user", user_routes)
        .nest("/leaderboard", leaderboard_routes)
        .route("/puzzle/daily", get(puzzles::daily_puzzle))
        .layer(from_fn_with_state(limits.api.clone(), rate_limit::enforce))
        // Not rate limited
        .route("/health", get(health::health_check))
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}
