mod api;
mod app;
mod config;
mod domain;
mod error;
mod logging;
mod routes;
mod services;
mod storage;

use anyhow::Result;
use std::sync::Arc;

use services::{ConfirmationWorkflow, DeliveryStore, InventoryService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting mobilier-tracker backend"
    );

    // Open the data directory and load persisted state
    let storage = storage::Storage::open(&settings.data_dir).await?;

    let store = Arc::new(DeliveryStore::load(storage.clone()).await);
    tracing::info!(count = store.get_all().len(), "delivery records loaded");

    let confirmations = Arc::new(ConfirmationWorkflow::load(storage, store.clone()).await);
    tracing::info!(
        count = confirmations.get_all().len(),
        "region confirmations loaded"
    );

    // Log dashboard progress as it moves, via the store's watch channel.
    tokio::spawn({
        let mut summaries = store.subscribe();
        async move {
            while summaries.changed().await.is_ok() {
                let snapshot = summaries.borrow_and_update();
                tracing::debug!(
                    revision = snapshot.revision,
                    progress = snapshot.overall_progress,
                    "Summary snapshot updated"
                );
            }
        }
    });

    let inventory = InventoryService::new(settings.stock_file.clone());

    // Create application state
    let state = app::AppState::new(settings.clone(), store, confirmations, inventory);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
