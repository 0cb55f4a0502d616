use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod models;
mod services;

use config::Config;
use db::Store;
use services::summarizer::{GeminiClient, TextGenerator};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<Config>,
    pub generator: Arc<dyn TextGenerator>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uplift_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    let store = Arc::new(Store::new(pool));
    store.init().await.expect("Failed to initialize database");

    // Summarization
    let generator: Arc<dyn TextGenerator> = Arc::new(
        GeminiClient::from_config(&config).expect("Failed to build summarization client"),
    );
    match config.summary_warning() {
        Some(warning) => tracing::warn!("{}", warning),
        None => tracing::info!(model = %config.gemini_model, "Nightly summaries enabled"),
    }

    let state = AppState {
        store,
        config: config.clone(),
        generator,
    };

    let app = build_router(state, cors_layer(&config));

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    let api_routes = Router::new()
        .route("/api/status", get(handlers::health::status))
        .route(
            "/api/morning-checkins",
            post(handlers::morning::save_morning_checkin),
        )
        .route(
            "/api/nightly-checkins",
            post(handlers::nightly::submit_nightly_checkin),
        )
        .route("/api/history", get(handlers::history::get_history))
        .route("/api/days/:date", get(handlers::history::get_day));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = Vec::new();
        match config.frontend_url.parse::<axum::http::HeaderValue>() {
            Ok(origin) => origins.push(origin),
            Err(_) => tracing::warn!(url = %config.frontend_url, "Ignoring invalid FRONTEND_URL"),
        }
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
}
