mod auth;
mod config;
mod db;
mod error;
mod extractors;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::auth::session;
use crate::config::{Cli, Config};
use crate::services::image::{ImageService, SqliteImageService};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Ensure uploads directory exists
    std::fs::create_dir_all(config.uploads_path())?;

    // Initialize database
    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    // Build app state
    let state = AppState {
        db: pool.clone(),
        config: config.clone(),
    };

    // Best-effort background sweep: expired sessions and stale pending
    // images
    let sweep_pool = pool.clone();
    let sweep_uploads = config.uploads_path().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;

            match session::reap_expired(&sweep_pool, Utc::now()) {
                Ok(report) if report.reaped > 0 || report.failed > 0 => {
                    tracing::info!(
                        "Session reap: {} removed, {} failed",
                        report.reaped,
                        report.failed
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Session reap failed: {}", e),
            }

            let images = SqliteImageService::new(sweep_pool.clone(), sweep_uploads.clone());
            match images.remove_stale_pending(Utc::now() - chrono::Duration::days(1)) {
                Ok(report) if report.removed > 0 || report.failed > 0 => {
                    tracing::info!(
                        "Image cleanup: {} removed, {} failed",
                        report.removed,
                        report.failed
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Image cleanup failed: {}", e),
            }
        }
    });

    // Build router
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
