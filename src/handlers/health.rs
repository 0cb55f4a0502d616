use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::dto::StatusResponse;
use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "uplift-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db_ok = state.store.is_initialized() && state.store.ping().await;

    if db_ok {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "database": "ok" },
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "database": "failed" },
            })),
        )
    }
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let summaries_enabled = state.generator.is_configured();
    Json(StatusResponse {
        summaries_enabled,
        model: state.generator.model().to_string(),
        warning: if summaries_enabled {
            None
        } else {
            state.config.summary_warning()
        },
    })
}
