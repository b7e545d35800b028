//! Matchday - football score prediction service
//!
//! Users predict match scores through a guided dialogue; admins record
//! official results, which re-scores every prediction for that match.

mod api;
mod config;
mod db;
mod engine;
mod scoring;
mod session;
mod store;
mod transport;
mod validate;
mod week;

use api::{create_router, AppState};
use config::Config;
use db::Database;
use engine::Engine;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matchday=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    // Ensure the database directory exists
    if let Some(parent) = PathBuf::from(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path, "Opening database");
    let db = Database::open(&config.db_path)?;

    if let Some(fixtures) = &config.fixtures_path {
        let imported = db::import::load_fixtures(&db, Path::new(fixtures))?;
        tracing::info!(imported, path = %fixtures, "Fixtures imported");
    }

    if config.admin_ids.is_empty() {
        tracing::warn!("No admin ids configured. Set MATCHDAY_ADMIN_IDS to enable result entry.");
    }

    let port = config.port;
    let state = AppState::new(Engine::new(db, config));
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Matchday listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
