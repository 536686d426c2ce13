//! State management module
//!
//! Shared application state handed to the HTTP handlers.

pub mod app_state;

// Re-export main types
pub use app_state::AppState;
