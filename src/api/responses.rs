//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::timer::{TimerSnapshot, TimerState};
use crate::settings::Settings;

/// API response structure for timer command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
    pub remaining_display: String,
}

impl ApiResponse {
    /// Build a response describing the timer after a command applied.
    pub fn for_snapshot(message: String, snapshot: TimerSnapshot, settings: &Settings) -> Self {
        Self {
            status: state_label(snapshot.state).to_string(),
            message,
            timestamp: Utc::now(),
            timer: snapshot,
            remaining_display: crate::core::duration::format_remaining(
                snapshot.remaining_seconds,
                settings.display_format,
            ),
        }
    }
}

fn state_label(state: TimerState) -> &'static str {
    match state {
        TimerState::Idle => "idle",
        TimerState::Running => "running",
        TimerState::Paused => "paused",
    }
}

/// Full status response with timer and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub remaining_display: String,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_status_reflects_the_timer_state() {
        let settings = Settings::default();
        let snapshot = TimerSnapshot {
            state: TimerState::Running,
            remaining_seconds: 65,
        };
        let resp = ApiResponse::for_snapshot("Countdown started".to_string(), snapshot, &settings);
        assert_eq!(resp.status, "running");
        assert_eq!(resp.remaining_display, "01:05");
        assert_eq!(resp.timer.remaining_seconds, 65);
    }

    #[test]
    fn remaining_display_follows_the_configured_format() {
        let settings = Settings {
            display_format: crate::core::duration::DisplayFormat::HhMmSs,
            ..Settings::default()
        };
        let snapshot = TimerSnapshot {
            state: TimerState::Paused,
            remaining_seconds: 65,
        };
        let resp = ApiResponse::for_snapshot("Countdown paused".to_string(), snapshot, &settings);
        assert_eq!(resp.status, "paused");
        assert_eq!(resp.remaining_display, "00:01:05");
    }
}
