pub mod api;
pub mod config;
pub mod transcript;

use tokio::sync::watch;
use tracing::info;

use api::{build_router, state::AppState};
use config::Settings;
use transcript::registry::build_orchestrator;
use transcript::tools::ToolManager;

/// Build the provider chain from `settings` and serve the HTTP API until shutdown
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(&settings, &ToolManager::new())?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = build_router(AppState::new(orchestrator, &settings, shutdown_rx));

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down, cancelling in-flight requests");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}
