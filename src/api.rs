// src/api.rs
use std::sync::Arc;

use serde::Serialize;
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::format::welcome_text;
use crate::publisher::{PublishReport, Publisher};

#[derive(Clone)]
pub struct AppState {
    pub publisher: Arc<Publisher>,
    /// Shown in the `/start` welcome text.
    pub interval_secs: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/start", get(start))
        .route("/publish", post(publish))
        .route("/freshness", get(freshness))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn start(State(state): State<AppState>) -> String {
    welcome_text(state.interval_secs)
}

/// On-demand run, same path as a scheduler tick.
async fn publish(
    State(state): State<AppState>,
) -> Result<Json<PublishReport>, (StatusCode, String)> {
    state
        .publisher
        .publish_once()
        .await
        .map(Json)
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))
}

#[derive(Serialize)]
struct FreshnessOut {
    delivered: usize,
}

async fn freshness(State(state): State<AppState>) -> Json<FreshnessOut> {
    Json(FreshnessOut {
        delivered: state.publisher.selector().freshness().len(),
    })
}
