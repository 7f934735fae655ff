pub mod confirmations;
pub mod deliveries;
pub mod health;
pub mod regions;
pub mod summary;
pub mod transfer;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Deliveries
        .route("/deliveries", get(deliveries::list_deliveries))
        .route("/deliveries", post(deliveries::create_delivery))
        .route("/deliveries/bulk", post(deliveries::create_deliveries_bulk))
        .route("/deliveries/:id", put(deliveries::update_delivery))
        .route("/deliveries/:id", delete(deliveries::delete_delivery))
        .route("/deliveries/:id/deliver", post(deliveries::mark_delivered))
        .route("/deliveries/:id/reset", post(deliveries::reset_delivery))
        // Dashboard summary
        .route("/summary", get(summary::get_summary))
        // Region reconciliation
        .route("/regions/status", get(regions::region_status))
        .route("/regions/:region/report.csv", get(regions::region_report_csv))
        // Confirmations
        .route("/confirmations", get(confirmations::list_confirmations))
        .route("/confirmations/:region", get(confirmations::get_confirmation))
        .route("/confirmations/:region", put(confirmations::save_confirmation))
        .route(
            "/confirmations/:region/status",
            get(confirmations::region_confirmed),
        )
        .route(
            "/confirmations/items/:delivery_id",
            get(confirmations::delivery_item_confirmed),
        )
        .route(
            "/confirmations/:region/generate",
            post(confirmations::generate_confirmation),
        )
        .route(
            "/confirmations/:region/furniture",
            post(confirmations::confirm_furniture_type),
        )
        .route(
            "/confirmations/items/:delivery_id/confirm",
            post(confirmations::confirm_delivery_item),
        )
        .route(
            "/confirmations/items/:delivery_id/unconfirm",
            post(confirmations::unconfirm_delivery_item),
        )
        // Data transfer
        .route("/transfer/export", get(transfer::export_deliveries))
        .route("/transfer/import", post(transfer::import_deliveries))
        .route("/transfer/clear", post(transfer::clear_all))
        .route("/transfer/initialize-stock", post(transfer::initialize_stock))
}
