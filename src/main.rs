//! Tally API Server
//!
//! Run with: cargo run --bin tally
//!
//! # Configuration
//!
//! Read from `TALLY_CONFIG` or the default config locations, then overridden
//! by environment variables. A config file that is named but missing, or that
//! fails to parse, stops the server before it starts.
//!
//! - `TALLY_DB_PATH`: SQLite database file, `:memory:` for no persistence
//! - `TALLY_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `TALLY_API_PORT`: Port to listen on (default: 8090)
//! - `TALLY_REQUEST_TIMEOUT_SECS`: Aggregation timeout (default: 30)
//! - `TALLY_LOG_LEVEL`: Log level (default: info)
//! - `TALLY_LOG_FORMAT`: `pretty` or `json` (default: pretty)
//! - `RUST_LOG`: Full filter directive, overrides `TALLY_LOG_LEVEL`

use std::sync::Arc;
use tally::api::{serve, ApiConfig, AppState};
use tally::config::{Config, StorageConfig};
use tally::storage::{EventStore, MemoryEventStore, SqliteEventStore, StoreResult};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config errors abort startup; they are returned before logging exists
    let config_path = Config::locate()?;
    let config = match &config_path {
        Some(path) => Config::load_with_env(path)?,
        None => Config::from_env(),
    };
    tally::logging::init(&config.logging);

    tracing::info!("Starting Tally API server v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("No config file found, using defaults with environment overrides"),
    }

    let store = open_store(&config.storage)?;
    tracing::info!("Event store ready: {}", store.name());

    let api_config = ApiConfig::from(&config.api);
    let state = AppState::new(store, api_config.clone());

    serve(state, &api_config).await?;

    tracing::info!("Tally API server stopped");
    Ok(())
}

/// Open the configured event store
fn open_store(config: &StorageConfig) -> StoreResult<Arc<dyn EventStore>> {
    if config.is_in_memory() {
        tracing::warn!("Using in-memory event store, events are lost on shutdown");
        return Ok(Arc::new(MemoryEventStore::new()));
    }

    let path = config.resolved_db_path();
    tracing::info!("Database: {:?}", path);
    Ok(Arc::new(SqliteEventStore::open(&path)?))
}
