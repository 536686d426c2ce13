//! yrtimer - A state-managed countdown timer daemon
//!
//! This library provides a countdown timer state machine with free-form
//! duration parsing, configurable display formatting and bounded repeat
//! notifications, exposed through a small HTTP control surface.

pub mod api;
pub mod config;
pub mod core;
pub mod notify;
pub mod persist;
pub mod settings;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use crate::api::create_router;
pub use crate::config::Config;
pub use crate::core::{format_remaining, parse_duration, DisplayFormat, Timer, TimerState};
pub use crate::settings::Settings;
pub use crate::state::AppState;
pub use crate::utils::signals::shutdown_signal;
