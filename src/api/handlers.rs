//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{error::TimerError, state::AppState};
use super::responses::{
    CreateTimerRequest, HealthResponse, ListQuery, StatusResponse, TimerView,
};

/// Handle POST /timers - Create a timer from the form fields
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTimerRequest>,
) -> Result<(StatusCode, Json<TimerView>), TimerError> {
    let duration = request.duration.total_seconds()?;
    let timer = state.create(&request.label, duration, request.looping)?;
    Ok((StatusCode::CREATED, Json(timer.into())))
}

/// Handle GET /timers - List timers, optionally filtered by status
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<TimerView>> {
    Json(state.filter(query.status).into_iter().map(TimerView::from).collect())
}

/// Handle GET /timers/:id
pub async fn get_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimerView>, TimerError> {
    Ok(Json(state.get(id)?.into()))
}

/// Handle POST /timers/:id/toggle - Start, pause or restart a timer
pub async fn toggle_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimerView>, TimerError> {
    Ok(Json(state.toggle(id)?.into()))
}

/// Handle POST /timers/:id/reset
pub async fn reset_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimerView>, TimerError> {
    Ok(Json(state.reset(id)?.into()))
}

/// Handle DELETE /timers/:id
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    match state.delete(id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// Handle GET /events - Stream timer messages as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!("Event stream subscriber connected");
    let rx = state.subscribe();

    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse = Event::default().event(event.kind.as_str()).json_data(&event);
                    return Some((sse, rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream subscriber lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /status - Return collection counts and server info
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let counts = state.counts();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timers: counts.total,
        running: counts.running,
        completed: counts.completed,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
