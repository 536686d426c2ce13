//! Persisted last-state record
//!
//! Written on every timer change and once more at shutdown, read once at
//! startup. A countdown that was running when the daemon stopped is
//! offered back as a paused countdown with the same remaining time; it is
//! never auto-resumed, and paused or idle records are left alone.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::timer::{TimerSnapshot, TimerState};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access state file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode or decode state: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastState {
    pub state: TimerState,
    pub remaining: u64,
    pub saved_at: DateTime<Utc>,
}

impl LastState {
    pub fn from_snapshot(snapshot: TimerSnapshot) -> Self {
        Self {
            state: snapshot.state,
            remaining: snapshot.remaining_seconds,
            saved_at: Utc::now(),
        }
    }
}

pub fn save_last_state(path: &Path, snapshot: TimerSnapshot) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let payload = serde_json::to_string(&LastState::from_snapshot(snapshot))?;
    fs::write(path, payload)?;
    Ok(())
}

pub fn load_last_state(path: &Path) -> Result<Option<LastState>, PersistError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

/// The remaining seconds to restore as a paused countdown, if the record
/// warrants it: only a previously running timer is brought back.
pub fn paused_resume(last: &LastState) -> Option<u64> {
    (last.state == TimerState::Running && last.remaining > 0).then_some(last.remaining)
}
