// Bazi Fortune - Web Server

use anyhow::{Context, Result};
use bazi_fortune::api::{self, AppState};
use bazi_fortune::{Config, HistoryStore};
use log::info;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("Failed to read configuration")?;
    let history = HistoryStore::with_capacity(&config.history_file, config.history_capacity);
    info!(
        "History file {:?} (capacity {})",
        history.path(),
        history.capacity()
    );

    let app = api::router(AppState::new(Arc::new(history)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Server running on http://{}", config.bind_addr);
    info!("API: POST /api/calculate, GET /api/history, GET /api/statistics");

    axum::serve(listener, app)
        .await
        .context("Server stopped with an error")?;

    Ok(())
}
