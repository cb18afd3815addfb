use std::sync::Arc;

use saferide::api;
use saferide::config::Config;
use saferide::error::AppError;
use saferide::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.compact().init();
    }

    let shared_state = Arc::new(AppState::new(
        config.simulation.clone(),
        config.event_buffer_size,
    ));
    tracing::info!(
        drivers = shared_state.drivers.len(),
        surge_probability = shared_state.estimator.surge_probability(),
        seeded = config.simulation.rng_seed.is_some(),
        "booking state ready"
    );

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    let open = shared_state.sessions.len();
    shared_state.timers.clear();
    tracing::info!(open_bookings = open, "server stopped; simulations released");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
