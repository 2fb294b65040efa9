mod auth;
mod config;
mod db;
mod error;
mod ledger;
mod models;
mod rate_limit;
mod routes;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use config::Config;
use daily_puzzle_core::PuzzleGenerator;
use rate_limit::RateLimits;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub db: PgPool,
    /// Verifies submitted puzzle ids and serves the daily puzzle
    pub generator: PuzzleGenerator,
    pub limits: RateLimits,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daily_puzzle_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Daily Puzzle backend server...");

    // Load configuration
    let config = Config::from_env()?;
    error::expose_internal_errors(!config.is_production());
    tracing::info!(
        "Configuration loaded (environment: {})",
        config.server.environment
    );

    // Connect to database
    let db = db::create_pool(config.database_url(), config.database.max_connections).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database migrations completed");

    let generator = config.puzzle.generator();
    tracing::info!("Puzzle schedule: {:?}", generator.schedule);

    // Create application state
    let state = Arc::new(AppState {
        limits: RateLimits::from_config(&config.limits),
        config: config.clone(),
        db,
        generator,
    });

    // Spawn background task to sweep expired rate-limit windows
    let cleanup_limits = state.limits.clone();
    tokio::spawn(async move {
        rate_limit::cleanup_task(cleanup_limits).await;
    });

    let app = routes::app(state);

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("Allowed client: {}", config.server.client_url);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
