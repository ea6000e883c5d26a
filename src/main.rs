//! meintimer - a multi-timer server
//!
//! This is the main entry point for the meintimer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use meintimer::{
    api::create_router,
    config::Config,
    services::SoundNotifier,
    state::AppState,
    storage::FileStore,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("meintimer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting meintimer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, sound={}, muted={}",
        config.host,
        config.port,
        config.sound.display(),
        config.mute
    );

    let store = Arc::new(FileStore::open(config.data_dir())?);
    info!("Saving timers in {}", store.dir().display());

    let notifier = Arc::new(SoundNotifier::new(
        config.player.clone(),
        config.sound.clone(),
        config.mute,
    ));

    // Create application state and restart countdowns that were running
    let state = Arc::new(AppState::new(store, notifier, config.host.clone(), config.port));
    state.resume_running();

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /timers            - Create a timer");
    info!("  GET    /timers            - List timers (?status=all|active|completed)");
    info!("  GET    /timers/:id        - Show a timer");
    info!("  POST   /timers/:id/toggle - Start, pause or restart a timer");
    info!("  POST   /timers/:id/reset  - Reset a timer");
    info!("  DELETE /timers/:id        - Delete a timer");
    info!("  GET    /events            - Server-sent timer messages");
    info!("  GET    /status            - Counts and uptime");
    info!("  GET    /health            - Health check");

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

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
