use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod middleware;
mod modules;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use config::settings::AppConfig;
use infrastructure::db::pool;
use infrastructure::media::{FfmpegRemuxer, FfprobeProber};
use infrastructure::storage::StorageService;
use modules::video::repository::PgVideoRepository;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("missing required environment variable")?;

    let db = pool::connect_to_db(&config.database_url, config.database_max_connections)
        .await
        .context("couldn't connect to database")?;
    pool::run_migrations(&db).await.context("couldn't apply migrations")?;

    let storage = StorageService::new(&config).await?;

    tokio::fs::create_dir_all(&config.assets_root)
        .await
        .with_context(|| format!("couldn't create {}", config.assets_root.display()))?;
    tokio::fs::create_dir_all(&config.upload_temp_dir)
        .await
        .with_context(|| format!("couldn't create {}", config.upload_temp_dir.display()))?;

    let state = AppState::new(
        config.clone(),
        Arc::new(PgVideoRepository::new(db)),
        Arc::new(storage),
        Arc::new(FfprobeProber::new(config.ffprobe_path.clone())),
        Arc::new(FfmpegRemuxer::new(config.ffmpeg_path.clone())),
    );

    let app = app::create_app(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("couldn't bind {}", addr))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
