//! PhotoSync server entry point: loads configuration, connects storage
//! and the database, assembles [`AppState`], optionally starts the
//! background Integrity Scanner loop, and serves the HTTP API.

mod auth;
mod auth_broker;
mod config;
mod db;
mod errors;
mod hashing;
mod ingestion;
mod metadata;
mod middleware;
mod notify;
mod routes;
mod scanner;
mod state;
mod storage;
mod sync;
mod thumbnails;

#[cfg(test)]
mod tests;
#[cfg(test)]
mod http_test;

use std::sync::Arc;
use std::time::Duration;

use db::sql::SqlDb;
use notify::{LoggingEmailNotifier, LoggingPushNotifier};
use scanner::ScannerHandle;
use state::AppState;
use storage::PhotoStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::AppConfig::from_env()?;
    log::info!("[main] starting PhotoSync on {}", config.server_address);

    let db = SqlDb::connect(config.database_url.as_deref(), &config.database_path).await?;
    db.migrate().await?;
    log::info!("[main] database ready (networked={})", config.database_url.is_some());

    let storage = PhotoStore::new(config.photo_storage_path.clone())?;

    let scanner = ScannerHandle::new();
    let db: Arc<dyn db::Db> = Arc::new(db);

    let state = AppState {
        db: db.clone(),
        storage: Arc::new(storage),
        config: Arc::new(config.clone()),
        push: Arc::new(LoggingPushNotifier),
        email: Arc::new(LoggingEmailNotifier),
        thumbnail_semaphore: AppState::thumbnail_semaphore_default(),
        scanner: scanner.clone(),
    };

    if config.file_scanner_enabled && config.file_scanner_auto_start {
        spawn_scanner_loop(state.clone());
    }

    let app = routes::build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    log::info!("[main] listening on {}", config.server_address);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Runs the Integrity Scanner on the configured interval, forever, in
/// the background. A scan already in progress (e.g. triggered
/// on-demand through an operator endpoint) is skipped, not queued
/// (§4.8).
fn spawn_scanner_loop(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(state.config.file_scanner_interval_hours.max(1) * 3600));
        loop {
            ticker.tick().await;
            match state.scanner.try_scan(state.db.clone(), state.config.photo_storage_path.clone()).await {
                Some(Ok(summary)) => log::info!(
                    "[scanner] scan complete: {} files scanned, {} orphans, {} conflicts",
                    summary.files_scanned,
                    summary.orphans_found,
                    summary.conflicts_found
                ),
                Some(Err(e)) => log::error!("[scanner] scan failed: {e:#}"),
                None => log::debug!("[scanner] skipped: a scan is already in progress"),
            }
        }
    });
}
