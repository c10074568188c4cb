mod api_doc;
mod config;
mod error;
mod executor;
mod handlers;
mod memory;
mod models;
mod repository;
mod routes;
mod spanner;
mod state;

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::{Config, StorageBackend};
use executor::QueryExecutor;
use memory::MemoryExecutor;
use repository::StorageRepository;
use spanner::SpannerClient;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("rust-storage-kv starting");

    let config = Config::from_env()?;
    config.log_startup();

    let executor: Arc<dyn QueryExecutor> = match &config.backend {
        StorageBackend::Spanner(spanner) => Arc::new(SpannerClient::from_config(spanner).await?),
        StorageBackend::Memory => Arc::new(MemoryExecutor::new()),
    };
    let repository = StorageRepository::new(executor, config.store_timeout);

    let app = routes::router(AppState {
        store: Arc::new(repository),
    });

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
