use docrag::config::Settings;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    init_tracing();

    tracing::info!(
        "Starting docrag (storage: {:?}, embeddings: {:?} {})",
        settings.storage_backend,
        settings.embedding_provider,
        settings.embedding_model
    );

    docrag::start_api_server(settings).await
}
