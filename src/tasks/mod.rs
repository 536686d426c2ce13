//! Background tasks module
//!
//! The timer service loop that runs alongside the HTTP server.

pub mod timer_service;

// Re-export main types
pub use timer_service::{spawn_timer_service, ServiceError, TimerServiceHandle};
