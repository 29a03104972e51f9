//! HTTP routes over the station facade.

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use smartpark_engine::{AccessResult, AccessStatus, ControlOutcome, ParkingStation, SystemStatus};
use smartpark_hardware::JPEG_CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::DEFAULT_STREAM_INTERVAL;
use crate::video::{MJPEG_CONTENT_TYPE, mjpeg_stream};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    station: Arc<ParkingStation>,
    stream_interval: Duration,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(station: Arc<ParkingStation>) -> Self {
        Self {
            station,
            stream_interval: DEFAULT_STREAM_INTERVAL,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_stream_interval(mut self, interval: Duration) -> Self {
        self.stream_interval = interval;
        self
    }

    /// Cancelling `token` ends every open video stream, which lets a
    /// graceful shutdown finish.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn station(&self) -> &Arc<ParkingStation> {
        &self.station
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/start", post(start))
        .route("/stop", post(stop))
        .route("/status", get(status))
        .route("/logs", get(logs))
        .route("/frame.jpg", get(frame))
        .route("/video_feed", get(video_feed))
        .route("/manual", post(manual))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ControlResponse {
    status: &'static str,
    message: &'static str,
}

impl ControlResponse {
    fn ok(message: &'static str) -> Json<Self> {
        Json(Self {
            status: "ok",
            message,
        })
    }
}

async fn start(State(state): State<AppState>) -> Json<ControlResponse> {
    match state.station.start().await {
        ControlOutcome::Applied => ControlResponse::ok("Recognition started"),
        ControlOutcome::NoOp => ControlResponse::ok("Recognition already running"),
    }
}

async fn stop(State(state): State<AppState>) -> Json<ControlResponse> {
    match state.station.stop().await {
        ControlOutcome::Applied => ControlResponse::ok("Recognition stopped"),
        ControlOutcome::NoOp => ControlResponse::ok("Recognition not running"),
    }
}

async fn status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(state.station.status())
}

/// Log lines as `[HH:MM:SS] message`, oldest first.
async fn logs(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(
        state
            .station
            .logs()
            .iter()
            .map(ToString::to_string)
            .collect(),
    )
}

async fn frame(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, JPEG_CONTENT_TYPE)],
        state.station.frame_jpeg(),
    )
}

async fn video_feed(State(state): State<AppState>) -> impl IntoResponse {
    let stream = mjpeg_stream(
        Arc::clone(&state.station),
        state.stream_interval,
        state.shutdown.clone(),
    );
    (
        [
            (header::CONTENT_TYPE, MJPEG_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
}

#[derive(Debug, Default, Deserialize)]
struct ManualRequest {
    #[serde(default, alias = "plate")]
    patente: Option<String>,
}

/// Manual plate entry. The body is parsed by hand so that a missing or
/// unreadable body gets the same `{"status":"error"}` shape as a missing
/// plate.
async fn manual(State(state): State<AppState>, body: Bytes) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ManualRequest::default()
    } else {
        match serde_json::from_slice::<ManualRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "unreadable manual entry body");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(AccessResult::error(format!("Invalid request body: {e}"))),
                )
                    .into_response();
            }
        }
    };

    let result = state
        .station
        .manual_entry(request.patente.as_deref().unwrap_or_default())
        .await;
    let code = match result.status {
        AccessStatus::Error => StatusCode::BAD_REQUEST,
        AccessStatus::Ok | AccessStatus::Denied => StatusCode::OK,
    };
    (code, Json(result)).into_response()
}
