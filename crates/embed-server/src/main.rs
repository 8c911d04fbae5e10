//! embed-server: load the embedding model once, then serve it over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use embed_server::{load_embedder, router, wait_for_shutdown, AppState, InferencePool};
use model_fetch::{ModelCache, MODEL_NAME};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "embed-server")]
#[command(about = "Text embedding HTTP service")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 8000, env = "EMBED_PORT")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "EMBED_BIND")]
    bind: String,

    /// Inference jobs allowed to run at once
    #[arg(long, default_value_t = 1, env = "EMBED_MAX_CONCURRENT")]
    max_concurrent: usize,

    /// Requests allowed to wait for a free inference slot
    #[arg(long, default_value_t = 64, env = "EMBED_MAX_QUEUED")]
    max_queued: usize,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = 16 * 1024 * 1024, env = "EMBED_MAX_UPLOAD_BYTES")]
    max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "embed_server=info,semantic_embeddings=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load the model before binding; a failure here ends the process
    let model_dir = ModelCache::default_location()?.repo_dir(MODEL_NAME);
    let embedder = match load_embedder(model_dir).await {
        Ok(embedder) => embedder,
        Err(e) => {
            tracing::error!("Error loading model or tokenizer: {:#}", e);
            return Err(e.context(format!("Failed to load model {}", MODEL_NAME)));
        }
    };
    tracing::info!("Model and tokenizer loaded successfully for {}", MODEL_NAME);

    let state = Arc::new(AppState::ready(
        embedder,
        InferencePool::new(cli.max_concurrent, cli.max_queued),
    ));
    let app = router(state, cli.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port)
        .parse()
        .context("Invalid bind address")?;

    tracing::info!("Starting embed-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            wait_for_shutdown().await;
        })
        .await?;

    tracing::info!("Embed server shut down");
    Ok(())
}
