//! Staylink synchronization daemon.
//!
//! Long-running worker that keeps hotel inventory, rates and availability
//! aligned with connected OTA channels. Sweeps for stale integrations on
//! a fixed interval, fans the work out with bounded concurrency and
//! forwards inbound guest records to the property management system.

mod config;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing::info;

use staylink_channel::registry::AdapterRegistry;
use staylink_sync::{PgSyncStore, PmsForwarder, SyncEngine, SyncScheduler};

use config::Config;

#[tokio::main]
async fn main() {
    // Load configuration (fail-fast on missing required values)
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        tick_secs = config.scheduler.tick_secs,
        concurrency = config.scheduler.concurrency,
        availability_window_days = config.engine.availability_window_days,
        pms_enabled = config.pms.enabled,
        "Starting staylink sync daemon"
    );

    // Create database connection pool
    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            info!("Database connection established");
            pool
        }
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    // Apply pending schema migrations before any queries run
    if let Err(e) = staylink_db::run_migrations(&pool).await {
        eprintln!("FATAL: Database migration failed: {e}");
        std::process::exit(1);
    }

    let registry = match AdapterRegistry::with_defaults() {
        Ok(r) => Arc::new(r),
        Err(e) => {
            eprintln!("FATAL: Failed to build adapter registry: {e}");
            std::process::exit(1);
        }
    };

    let store = Arc::new(PgSyncStore::new(pool));
    let forwarder = Arc::new(PmsForwarder::spawn(config.pms.clone()));

    let engine = Arc::new(
        SyncEngine::new(store, registry)
            .with_config(config.engine.clone())
            .with_forwarder(forwarder),
    );

    let scheduler = Arc::new(SyncScheduler::with_config(engine, config.scheduler.clone()));

    let runner = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            scheduler.run().await;
        })
    };

    shutdown_signal().await;

    // Stop sweeping and wait for in-flight syncs to drain
    scheduler.shutdown();
    if let Err(e) = runner.await {
        tracing::error!("Scheduler task failed: {e}");
    }

    info!("Sync daemon shutdown complete");
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {e}");
                // Fall through - we still want to wait for terminate signal
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                // Wait forever if we can't install the handler
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
