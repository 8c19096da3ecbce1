//! Claims Service
//!
//! Opens the database, applies the schema and checks that the service layer
//! can reach it by loading the static lookups.

use anyhow::Context;
use claims_service::config::Config;
use claims_service::data::SqliteDataAccess;
use claims_service::services::Services;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let data = SqliteDataAccess::connect(&config.database)
        .await
        .context("Failed to open claims database")?;
    let services = Services::new(Arc::new(data), config.pagination);

    let statuses = services.misc.get_claim_statuses().await?;
    let states = services.misc.get_states().await?;
    info!(
        statuses = statuses.len(),
        states = states.len(),
        "Lookups loaded"
    );

    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Claims service ready at {}", config.database.path);
    Ok(())
}
