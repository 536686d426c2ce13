//! yrtimer - A state-managed countdown timer daemon
//!
//! This is the main entry point for the yrtimer application.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use yrtimer::{
    api::create_router,
    config::Config,
    core::parse_duration,
    settings::Settings,
    state::AppState,
    tasks::spawn_timer_service,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Settings are loaded before tracing so the debug key can raise the
    // log level; any load error is reported right after init. A first run
    // writes the defaults out so there is a file to edit.
    let (settings, settings_err) = Settings::load_or_init(&config.settings_path());
    let settings = Arc::new(settings);

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "yrtimer={},tower_http=info",
            config.log_level(settings.debug)
        ))
        .init();

    info!("Starting yrtimer daemon v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, settings={}",
        config.host,
        config.port,
        config.settings_path().display()
    );
    if let Some(e) = settings_err {
        warn!("settings file problem, using defaults: {e}");
    }

    // Start the timer service on its own thread
    let service = spawn_timer_service(
        Arc::clone(&settings),
        config.state_file(),
        config.sound_dir.clone(),
    )?;

    // Create application state
    let state = Arc::new(AppState::new(
        service,
        Arc::clone(&settings),
        config.port,
        config.host.clone(),
    ));

    // Optionally kick off a countdown straight away
    if let Some(input) = &config.start {
        let seconds = parse_duration(input);
        if seconds > 0 {
            state.start_timer(Some(seconds as i64)).await?;
            info!("Initial countdown started: {}s", seconds);
        } else {
            warn!("--start '{}' did not parse to a duration, ignoring", input);
        }
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start         - Start or resume the countdown");
    info!("  POST /pause         - Pause the countdown");
    info!("  POST /reset         - Reset the countdown");
    info!("  POST /preset/:index - Start a configured preset");
    info!("  GET  /status        - Timer and server status");
    info!("  GET  /settings      - Effective settings");
    info!("  GET  /health        - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Persist the final timer state before exiting
    if let Err(e) = state.shutdown().await {
        warn!("timer service shutdown failed: {e}");
    }

    info!("Server shutdown complete");
    Ok(())
}
