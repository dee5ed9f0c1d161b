use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use order_runner::api;
use order_runner::config::{Config, LogFormat};
use order_runner::error::AppError;
use order_runner::geo::distance::DistanceMatrixClient;
use order_runner::state::AppState;
use order_runner::store::OrderStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Json => subscriber.json().init(),
    }

    if config.distance_api_key.is_none() {
        tracing::warn!("DISTANCE_API_KEY is not set; order placement will fail");
    }

    let store = match OrderStore::connect(&config.database_url, config.database_max_connections).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, "database connection failed");
            return Err(err);
        }
    };

    let resolver = DistanceMatrixClient::new(
        config.distance_api_url.clone(),
        config.distance_api_key.clone(),
        config.distance_timeout,
    )?;

    let shared_state = Arc::new(AppState::new(store, Arc::new(resolver))?);
    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    tracing::info!("http server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
