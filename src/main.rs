use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use pdfqa_core::bootstrap::create_provider;
use pdfqa_core::config::{Config, resolve_config_path};
use pdfqa_core::{PdfIngestor, QaService};
use pdfqa_gateway::GatewayServer;
use pdfqa_memory::SqliteStore;
use pdfqa_memory::document::{RetrievalPipeline, SplitterConfig, TextSplitter};
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "pdfqa", version, about = "Ask questions about uploaded PDFs over a WebSocket")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    config.validate()?;
    tracing::info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        "configuration loaded from {}",
        config_path.display()
    );

    let provider = create_provider(&config)?;
    let store = SqliteStore::new(&config.storage.sqlite_path)
        .await
        .with_context(|| format!("failed to open database {}", config.storage.sqlite_path))?;

    let splitter = TextSplitter::new(SplitterConfig {
        chunk_size: config.retrieval.chunk_size,
        chunk_overlap: config.retrieval.chunk_overlap,
    });
    let qa = QaService::new(
        store.clone(),
        provider,
        RetrievalPipeline::new(splitter, config.retrieval.top_k),
    )
    .with_timeouts(
        Duration::from_secs(config.timeouts.llm_seconds),
        Duration::from_secs(config.timeouts.embedding_seconds),
    );
    let ingestor = PdfIngestor::new(store.clone(), &config.storage.upload_dir);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let gateway = &config.gateway;
    GatewayServer::new(
        &gateway.bind,
        gateway.port,
        store,
        ingestor,
        qa,
        shutdown_rx,
    )
    .with_rate_limit(
        gateway.rate_limit,
        Duration::from_secs(gateway.rate_window_secs),
    )
    .with_max_body_size(gateway.max_body_size)
    .serve()
    .await?;

    Ok(())
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
