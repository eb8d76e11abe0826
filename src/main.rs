use anyhow::{Context, Result};
use axum::Router;
use lake_level_forecast::{api, config, state, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;

    let app_state = tokio::task::spawn_blocking({
        let cfg = cfg.clone();
        move || state::AppState::load(cfg)
    })
    .await
    .context("startup loader panicked")??;

    if !app_state.context.is_dataset_available() {
        warn!("starting in degraded mode: forecasts are unavailable until the dataset is fixed and the service restarted");
    }

    let app: Router = api::router(app_state, &cfg);

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!("server binding to 0.0.0.0, service will be reachable from the network");
    }

    info!(%addr, model = state::MODEL_NAME, "starting lake level forecast service");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
