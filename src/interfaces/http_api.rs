//! HTTP façade over the settings and reading stores
//!
//! Store calls are synchronous SQLite work, so they run on the blocking pool.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::data_mgmt::{ConfigStore, ReadingStore, SettingsError};

pub const SETTINGS_PATH: &str = "/api/settings";
pub const CURRENT_PATH: &str = "/api/data/current";

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ConfigStore>,
    pub readings: Arc<dyn ReadingStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SETTINGS_PATH, get(get_settings).post(update_settings))
        .route(CURRENT_PATH, get(get_current))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("Serving API on http://{addr}");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

async fn get_settings(State(state): State<AppState>) -> Response {
    Json(state.settings.get()).into_response()
}

async fn update_settings(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let payload = match body {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid settings format: {}", rejection.body_text()),
            )
        }
    };

    let settings = Arc::clone(&state.settings);
    match tokio::task::spawn_blocking(move || settings.replace(&payload)).await {
        Ok(Ok(_)) => Json(json!({ "status": "success" })).into_response(),
        Ok(Err(SettingsError::Invalid(e))) => {
            log::warn!("Rejected settings update: {}", e);
            error_response(StatusCode::BAD_REQUEST, format!("Invalid settings format: {e}"))
        }
        Ok(Err(e)) => {
            log::error!("Settings update failed: {}", e);
            internal_error()
        }
        Err(e) => {
            log::error!("Settings update task failed: {}", e);
            internal_error()
        }
    }
}

async fn get_current(State(state): State<AppState>) -> Response {
    let readings = Arc::clone(&state.readings);
    match tokio::task::spawn_blocking(move || readings.latest()).await {
        Ok(Ok(Some(reading))) => Json(reading).into_response(),
        Ok(Ok(None)) => Json(json!({})).into_response(),
        Ok(Err(e)) => {
            log::error!("Could not load latest reading: {}", e);
            internal_error()
        }
        Err(e) => {
            log::error!("Latest reading task failed: {}", e);
            internal_error()
        }
    }
}
