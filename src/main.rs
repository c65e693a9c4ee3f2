mod config;
mod llm;
mod models;
mod output;
mod pipeline;
mod routes;
mod slot;

use anyhow::Context;
use routes::{router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{config::AppConfig, llm::ChatClient, pipeline::Pipeline, slot::ResultSlot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env().context("reading configuration")?;
    tracing::info!(
        "Using API key: {} (expander: {}, generator: {})",
        config.model.redacted_key(),
        config.model.expander_model,
        config.model.generator_model
    );
    if config.model.api_key.is_empty() {
        tracing::warn!("GROQ_API_KEY is not set; every generation will fail until it is");
    }

    let client = ChatClient::new(config.model.clone()).context("building HTTP client")?;
    let state = AppState {
        pipeline: Arc::new(Pipeline::from_config(Arc::new(client), &config.model)),
        slot: Arc::new(ResultSlot::new()),
        output_dir: config.output_dir.clone(),
        expander_model: config.model.expander_model.clone(),
        generator_model: config.model.generator_model.clone(),
    };

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.bind_addr, config.port))?;
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
