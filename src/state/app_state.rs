//! Main application state management

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::core::duration::format_remaining;
use crate::core::timer::TimerSnapshot;
use crate::settings::Settings;
use crate::tasks::{ServiceError, TimerServiceHandle};

/// Application state shared with every HTTP handler: the timer service
/// handle, the effective settings and server metadata.
#[derive(Debug)]
pub struct AppState {
    service: TimerServiceHandle,
    pub settings: Arc<Settings>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<String>>,
    last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(
        service: TimerServiceHandle,
        settings: Arc<Settings>,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            service,
            settings,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Start or resume a countdown.
    pub async fn start_timer(&self, seconds: Option<i64>) -> Result<TimerSnapshot, ServiceError> {
        info!(?seconds, "starting countdown");
        self.record_action("start");
        self.service.start(seconds).await
    }

    pub async fn pause_timer(&self) -> Result<TimerSnapshot, ServiceError> {
        info!("pausing countdown");
        self.record_action("pause");
        self.service.pause().await
    }

    pub async fn reset_timer(&self) -> Result<TimerSnapshot, ServiceError> {
        info!("resetting countdown");
        self.record_action("reset");
        self.service.reset().await
    }

    /// Current timer snapshot, read without touching the timer thread.
    pub fn timer_snapshot(&self) -> TimerSnapshot {
        self.service.snapshot()
    }

    /// Remaining time rendered per the configured display format.
    pub fn formatted_remaining(&self) -> String {
        format_remaining(
            self.timer_snapshot().remaining_seconds,
            self.settings.display_format,
        )
    }

    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.service.shutdown().await
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }
}
