pub mod bias;
pub mod error;
pub mod forecast;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{config::Config, state::AppState};

pub fn router(state: AppState, cfg: &Config) -> Router {
    Router::new()
        .nest("/api/v1", v1_router(state))
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(cfg.server.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.server.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}

fn v1_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/forecast", post(forecast::post_forecast))
        .route("/bias-correction", post(bias::post_bias_correction))
        .with_state(state)
}
