//! Data transfer routes
//!
//! JSON export/import of the delivery collection, the composite clear and
//! the planned-stock seeding of an empty dataset.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::error::ApiError;
use crate::services::transfer;

/// GET /transfer/export
///
/// Full delivery collection as a pretty-printed JSON attachment.
pub async fn export_deliveries(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.store.export_snapshot();
    let json = transfer::export_json(&records)?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/json; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"livraisons_mobiliers.json\"".to_string(),
            ),
        ],
        json,
    ))
}

/// POST /transfer/import
///
/// Replaces the whole collection with the posted payload. Statuses are
/// normalized and unknown furniture labels dropped on the way in.
pub async fn import_deliveries(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let records = transfer::import_json(&body)
        .map_err(|e| ApiError::validation(format!("Import rejected: {e}")))?;

    let count = records.len();
    state.store.import_snapshot(records).await;
    info!(count, "delivery collection replaced by import");

    Ok(Json(MessageResponse::new(format!(
        "Imported {count} delivery records"
    ))))
}

/// POST /transfer/clear
///
/// Clears deliveries and confirmations together so reconciliation never
/// sees confirmations for records that no longer exist.
pub async fn clear_all(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.store.clear_all().await;
    state.confirmations.clear_all().await;
    info!("delivery and confirmation data cleared");

    Json(MessageResponse::new("All data cleared"))
}

/// POST /transfer/initialize-stock
///
/// Seeds one not-delivered record per planned furniture unit. Guarded by a
/// persisted flag so it only ever runs once per data directory.
pub async fn initialize_stock(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let baseline = state.inventory.baseline().await;

    match state.store.initialize_from_stock(&baseline).await {
        Some(created) => {
            info!(created, "stock-seeded delivery records created");
            (
                StatusCode::CREATED,
                Json(DataResponse::new(serde_json::json!({ "created": created }))),
            )
                .into_response()
        }
        None => Json(MessageResponse::with_code(
            "Stock already initialized",
            "ALREADY_INITIALIZED",
        ))
        .into_response(),
    }
}
