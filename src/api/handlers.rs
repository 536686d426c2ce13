//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::core::duration::parse_duration;
use crate::settings::Settings;
use crate::state::AppState;
use crate::tasks::ServiceError;

use super::responses::{ApiResponse, HealthResponse, StatusResponse};

/// Body for POST /start. Both fields are optional: a free-form duration
/// string, raw seconds, or neither (resume a paused countdown).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRequest {
    pub duration: Option<String>,
    pub seconds: Option<i64>,
}

impl StartRequest {
    /// The seconds to start with, or None to resume with what remains.
    /// A duration string that parses to nothing is treated as absent,
    /// mirroring how an empty entry falls back to resuming.
    fn resolve(&self) -> Option<i64> {
        if let Some(seconds) = self.seconds {
            return Some(seconds);
        }
        let parsed = parse_duration(self.duration.as_deref().unwrap_or(""));
        (parsed > 0).then_some(parsed as i64)
    }
}

/// Handle POST /start - Start or resume the countdown
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartRequest>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let seconds = request.resolve();

    match state.start_timer(seconds).await {
        Ok(snapshot) => {
            info!(remaining = snapshot.remaining_seconds, "start endpoint called");
            Ok(Json(ApiResponse::for_snapshot(
                "Countdown started".to_string(),
                snapshot,
                &state.settings,
            )))
        }
        Err(e) => Err(service_error("start", e)),
    }
}

/// Handle POST /pause - Pause a running countdown
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.pause_timer().await {
        Ok(snapshot) => Ok(Json(ApiResponse::for_snapshot(
            "Countdown paused".to_string(),
            snapshot,
            &state.settings,
        ))),
        Err(e) => Err(service_error("pause", e)),
    }
}

/// Handle POST /reset - Cancel the countdown and clear remaining time
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.reset_timer().await {
        Ok(snapshot) => Ok(Json(ApiResponse::for_snapshot(
            "Countdown reset".to_string(),
            snapshot,
            &state.settings,
        ))),
        Err(e) => Err(service_error("reset", e)),
    }
}

/// Handle POST /preset/:index - Start one of the configured presets
pub async fn preset_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let Some(&seconds) = state.settings.presets.get(index) else {
        return Err(StatusCode::NOT_FOUND);
    };

    match state.start_timer(Some(seconds as i64)).await {
        Ok(snapshot) => {
            info!(index, seconds, "preset endpoint called");
            Ok(Json(ApiResponse::for_snapshot(
                format!("Preset {} started", index),
                snapshot,
                &state.settings,
            )))
        }
        Err(e) => Err(service_error("preset", e)),
    }
}

/// Handle GET /status - Current timer and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();
    Json(StatusResponse {
        timer: state.timer_snapshot(),
        remaining_display: state.formatted_remaining(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Handle GET /settings - Effective settings, defaults included
pub async fn settings_handler(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json((*state.settings).clone())
}

fn service_error(endpoint: &str, e: ServiceError) -> StatusCode {
    error!("{} endpoint failed: {}", endpoint, e);
    StatusCode::SERVICE_UNAVAILABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_request_prefers_raw_seconds() {
        let request = StartRequest {
            duration: Some("10m".to_string()),
            seconds: Some(90),
        };
        assert_eq!(request.resolve(), Some(90));
    }

    #[test]
    fn start_request_parses_free_form_durations() {
        let request = StartRequest {
            duration: Some("2h 3m 4s".to_string()),
            seconds: None,
        };
        assert_eq!(request.resolve(), Some(7384));
    }

    #[test]
    fn unparseable_or_empty_duration_means_resume() {
        let request = StartRequest {
            duration: Some("abc".to_string()),
            seconds: None,
        };
        assert_eq!(request.resolve(), None);
        assert_eq!(StartRequest::default().resolve(), None);
    }
}
