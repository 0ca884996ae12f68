//! Ledger Service - HTTP API for atomic fund transfers
//!
//! This is the main entry point for the ledger service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_service::{create_router, AppState, ServiceConfig};
use ledger_store::{LedgerStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ledger_service=debug,ledger_store=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Ledger Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        database = ?config.database,
        db_max_connections = config.db_max_connections,
        run_migrations = config.run_migrations,
        "Service configuration loaded"
    );

    let store: Arc<dyn LedgerStore> = match &config.database {
        Some(database) => {
            let store = PgStore::connect_with(database.connect_options()?, &config.pool_settings())
                .await?;
            if config.run_migrations {
                store.migrate().await?;
            }
            Arc::new(store)
        }
        None => {
            tracing::warn!("No database configured - using in-memory store, data will not persist");
            Arc::new(MemoryStore::new())
        }
    };

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
