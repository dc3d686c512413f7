//! Foreground service for MorseVibe.
//!
//! This module keeps a long-running process alive that owns the vibration
//! device and accepts playback requests over a small REST API.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/encode` - Encode text without playing it
//! - `POST /api/playback` - Start playing text (`{ "text": "...", "speed": 0.0 }`)
//! - `GET /api/playback` - Current playback and job history
//! - `GET /api/playback/{id}` - Status of one playback
//! - `DELETE /api/playback/{id}` - Cancel a playback
//! - `GET /api/config` - Playback settings in use

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{Config, PlaybackConfig};
use crate::constants::{APP_NAME, SERVICE_STATUS};
use crate::morse::{encode, MorseString};
use crate::playback::device::{self, VibrationDevice};
use crate::playback::manager::{CancelOutcome, PlaybackJob, PlaybackManager};
use crate::playback::PlaybackError;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the web API.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    config: Arc<Config>,
    /// Playback slot and job history
    playback: Arc<PlaybackManager>,
}

impl AppState {
    /// Creates a new application state driving the configured device.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let device = device::from_config(&config.device);
        Self::with_device(config, device)
    }

    /// Creates a new application state with a custom device (for testing).
    #[must_use]
    pub fn with_device(config: Config, device: Arc<dyn VibrationDevice>) -> Self {
        let playback = PlaybackManager::new(device, config.playback.clone());
        Self {
            config: Arc::new(config),
            playback,
        }
    }

    /// Returns the playback manager.
    #[must_use]
    pub fn playback(&self) -> &Arc<PlaybackManager> {
        &self.playback
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Current health status (e.g., "healthy").
    pub status: String,
    /// Application version.
    pub version: String,
    /// Device being driven.
    pub device: String,
}

/// Request body for encoding.
#[derive(Debug, Deserialize)]
pub struct EncodeRequest {
    /// Text to encode.
    pub text: String,
}

/// Encoding result.
#[derive(Debug, Serialize)]
pub struct EncodeResponse {
    /// Text as sent.
    pub input: String,
    /// Encoded message.
    pub morse: MorseString,
    /// Number of pulses playback would issue.
    pub pulses: usize,
}

/// Request body for starting a playback.
#[derive(Debug, Deserialize)]
pub struct StartPlaybackRequest {
    /// Text to play.
    pub text: String,
    /// Speed slider value in `[0, 1]`.
    #[serde(default)]
    pub speed: f32,
}

/// Response for one playback job.
#[derive(Debug, Serialize)]
pub struct PlaybackJobResponse {
    /// The job information.
    pub job: PlaybackJob,
}

/// Response for the playback overview.
#[derive(Debug, Serialize)]
pub struct PlaybackListResponse {
    /// Job holding the playback slot.
    pub current: Option<PlaybackJob>,
    /// Remembered jobs, newest first.
    pub jobs: Vec<PlaybackJob>,
}

/// Playback settings response.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    /// Timings and overlap policy.
    pub playback: PlaybackConfig,
    /// Device being driven.
    pub device: String,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error message.
    pub error: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Maps a refused playback request to a status code.
fn playback_error(err: &PlaybackError) -> (StatusCode, Json<ApiError>) {
    match err {
        PlaybackError::EmptyInput
        | PlaybackError::NothingToPlay
        | PlaybackError::InvalidSpeed(_) => {
            (StatusCode::BAD_REQUEST, Json(ApiError::new(err.to_string())))
        }
        PlaybackError::Busy { active } => (
            StatusCode::CONFLICT,
            Json(ApiError::with_details(err.to_string(), active.clone())),
        ),
        PlaybackError::Device { error, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::with_details("Vibration device error", error.to_string())),
        ),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /health - Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        device: state.playback.device_name().to_string(),
    })
}

/// POST /api/encode - Encode text.
async fn encode_text(Json(request): Json<EncodeRequest>) -> Json<EncodeResponse> {
    let morse = encode(&request.text);
    Json(EncodeResponse {
        pulses: morse.pulse_count(),
        input: request.text,
        morse,
    })
}

/// POST /api/playback - Start a playback.
async fn start_playback(
    State(state): State<AppState>,
    Json(request): Json<StartPlaybackRequest>,
) -> ApiResult<(StatusCode, Json<PlaybackJobResponse>)> {
    let job = state
        .playback
        .start(&request.text, request.speed)
        .map_err(|e| playback_error(&e))?;

    Ok((StatusCode::ACCEPTED, Json(PlaybackJobResponse { job })))
}

/// GET /api/playback - Current playback and history.
async fn list_playbacks(State(state): State<AppState>) -> Json<PlaybackListResponse> {
    Json(PlaybackListResponse {
        current: state.playback.current(),
        jobs: state.playback.list_jobs(),
    })
}

/// GET /api/playback/{id} - One playback.
async fn get_playback(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<PlaybackJobResponse>> {
    state
        .playback
        .get_job(&job_id)
        .map(|job| Json(PlaybackJobResponse { job }))
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::new(format!("Playback not found: {job_id}"))),
            )
        })
}

/// DELETE /api/playback/{id} - Cancel a playback.
async fn cancel_playback(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<CancelOutcome>> {
    if state.playback.get_job(&job_id).is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new(format!("Playback not found: {job_id}"))),
        ));
    }
    Ok(Json(state.playback.cancel(&job_id)))
}

/// GET /api/config - Playback settings.
async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        playback: state.config.playback.clone(),
        device: state.playback.device_name().to_string(),
    })
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    // The service binds to localhost by default; any local page may drive it.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/encode", post(encode_text))
        .route("/api/playback", get(list_playbacks).post(start_playback))
        .route(
            "/api/playback/{id}",
            get(get_playback).delete(cancel_playback),
        )
        .route("/api/config", get(get_config))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the foreground service until Ctrl-C.
///
/// Any playback still running at shutdown is cancelled.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config, addr: SocketAddr) -> anyhow::Result<()> {
    let state = AppState::new(config);
    let playback = Arc::clone(state.playback());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("{APP_NAME} on {addr}: {SERVICE_STATUS}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    playback.cancel_current();
    Ok(())
}
