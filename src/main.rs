use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use youtube_transcript_lib::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "youtube_transcript_lib=debug,youtube_transcript=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!(
        host = %settings.app.host,
        port = settings.app.port,
        chain = ?settings.transcript.chain,
        policy = ?settings.transcript.response_policy,
        "Starting transcript service"
    );

    youtube_transcript_lib::run(settings).await
}
