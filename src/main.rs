use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use zone_tracer::api;
use zone_tracer::config::Config;
use zone_tracer::engine::sweep::run_inactive_sweep;
use zone_tracer::error::AppError;
use zone_tracer::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let shared_state = Arc::new(AppState::new(
        config.engine.clone(),
        config.event_buffer_size,
    ));

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(run_inactive_sweep(
        shared_state.clone(),
        tokio::time::Duration::from_secs(config.sweep_interval_secs),
        chrono::Duration::minutes(config.inactive_after_minutes),
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        zone_search_radius_km = config.engine.zone_search_radius_km,
        history_window_days = config.engine.history_window_days,
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
