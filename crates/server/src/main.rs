use std::net::SocketAddr;

use anyhow::Context;
use server::{AppState, app};
use services::services::config::ProxyConfig;
use tracing::info;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3001;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    utils::logging::init_tracing("server=info,services=info,tower_http=info");

    let config = ProxyConfig::from_env().context("invalid quote proxy configuration")?;
    let quotes = config.build_source()?;

    let host = std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Quote proxy listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(AppState::new(quotes)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Quote proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
