//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::TimerError,
    state::{format_time, DurationInput, StatusFilter, Timer, TimerStatus},
};

/// Body of `POST /timers`, mirroring the create form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTimerRequest {
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub duration: DurationInput,
    #[serde(default, rename = "loop")]
    pub looping: bool,
}

/// Query string of `GET /timers`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: StatusFilter,
}

/// A timer as rendered to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    #[serde(flatten)]
    pub timer: Timer,
    pub status: TimerStatus,
    /// Remaining time as `M:SS` or `H:MM:SS`
    pub display: String,
    /// Elapsed percentage
    pub progress: f64,
}

impl From<Timer> for TimerView {
    fn from(timer: Timer) -> Self {
        Self {
            status: timer.status(),
            display: format_time(timer.remaining),
            progress: timer.progress(),
            timer,
        }
    }
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for TimerError {
    fn into_response(self) -> Response {
        let status = if self.is_invalid_input() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::NOT_FOUND
        };
        warn!("Request rejected: {}", self);
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Status response with collection counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timers: usize,
    pub running: usize,
    pub completed: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
