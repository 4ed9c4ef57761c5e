//! HTTP adapter (axum).
//!
//! Exposes `GET /weather`, which fetches the forecast for the configured fixed
//! location and returns the reading for the current local hour, and `GET /health`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use wnotify_core::{
    domain::{Coordinates, CurrentReading},
    lookup::{current_hour_reading, hour_key},
    ports::{Clock, WeatherSource},
    Error, Result,
};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn WeatherSource>,
    pub clock: Arc<dyn Clock>,
    pub location: Coordinates,
}

/// Maps core errors onto status codes: `NotFound` is 404, everything else 500.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::NotFound(detail) => {
                tracing::debug!(%detail, "no reading for current hour");
                (StatusCode::NOT_FOUND, "not found").into_response()
            }
            other => {
                tracing::warn!(error = %other, "weather request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response()
            }
        }
    }
}

/// GET /weather - temperature for the current hour
pub async fn weather(
    State(state): State<AppState>,
) -> std::result::Result<Json<CurrentReading>, ApiError> {
    let snapshot = state.source.fetch(state.location).await?;
    let key = hour_key(state.clock.now());
    let reading = current_hour_reading(&snapshot, &key)?;
    Ok(Json(reading))
}

/// GET /health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/weather", get(weather))
        .with_state(state)
}

/// Serve on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = create_router(state);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "HTTP server listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
