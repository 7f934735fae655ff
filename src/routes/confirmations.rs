//! Region confirmation routes
//!
//! Boundary validation lives here (responsible party required, confirmed
//! counts clamped to [0, planned]); the workflow itself trusts its input.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::{FurnitureType, RegionConfirmation};
use crate::error::ApiError;

/// GET /confirmations
pub async fn list_confirmations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(DataResponse::new(state.confirmations.get_all()))
}

/// GET /confirmations/:region
pub async fn get_confirmation(
    State(state): State<Arc<AppState>>,
    Path(region): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let confirmation = state
        .confirmations
        .get(&region)
        .ok_or_else(|| ApiError::not_found(format!("No confirmation for region {region}")))?;
    Ok(Json(DataResponse::new(confirmation)))
}

/// GET /confirmations/:region/status
///
/// Lightweight gating check for clients that only need the boolean.
pub async fn region_confirmed(
    State(state): State<Arc<AppState>>,
    Path(region): Path<String>,
) -> impl IntoResponse {
    Json(DataResponse::new(serde_json::json!({
        "region": region,
        "confirmed": state.confirmations.is_region_confirmed(&region),
    })))
}

/// GET /confirmations/items/:delivery_id
pub async fn delivery_item_confirmed(
    State(state): State<Arc<AppState>>,
    Path(delivery_id): Path<u64>,
) -> impl IntoResponse {
    Json(DataResponse::new(serde_json::json!({
        "deliveryId": delivery_id,
        "confirmed": state.confirmations.is_delivery_item_confirmed(delivery_id),
    })))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "responsable")]
    pub responsible: String,
    #[serde(rename = "commentaire", default)]
    pub comment: String,
}

/// POST /confirmations/:region/generate
///
/// Convenience starting point seeded from current delivery totals; not
/// persisted until saved.
pub async fn generate_confirmation(
    State(state): State<Arc<AppState>>,
    Path(region): Path<String>,
    Json(req): Json<GenerateRequest>,
) -> impl IntoResponse {
    let confirmation = state
        .confirmations
        .generate(&region, &req.responsible, &req.comment);
    Json(DataResponse::new(confirmation))
}

/// PUT /confirmations/:region
pub async fn save_confirmation(
    State(state): State<Arc<AppState>>,
    Path(region): Path<String>,
    Json(confirmation): Json<RegionConfirmation>,
) -> Result<impl IntoResponse, ApiError> {
    if confirmation.region != region {
        return Err(ApiError::bad_request(
            "Confirmation region does not match the request path",
        ));
    }
    if confirmation.responsible.trim().is_empty() {
        return Err(ApiError::bad_request("A responsible party is required"));
    }

    let saved = state.confirmations.save(confirmation).await;
    Ok(Json(DataResponse::new(saved)))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmItemRequest {
    #[serde(rename = "responsable")]
    pub responsible: String,
    #[serde(rename = "commentaire", default)]
    pub comment: Option<String>,
}

/// POST /confirmations/items/:delivery_id/confirm
pub async fn confirm_delivery_item(
    State(state): State<Arc<AppState>>,
    Path(delivery_id): Path<u64>,
    Json(req): Json<ConfirmItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.responsible.trim().is_empty() {
        return Err(ApiError::bad_request("A responsible party is required"));
    }

    let confirmation = state
        .confirmations
        .confirm_delivery_item(delivery_id, &req.responsible, req.comment.as_deref())
        .await
        .ok_or_else(|| {
            ApiError::not_found(format!("No delivery record with id {delivery_id}"))
        })?;
    Ok(Json(DataResponse::new(confirmation)))
}

#[derive(Debug, Deserialize)]
pub struct UnconfirmItemRequest {
    pub region: String,
}

/// POST /confirmations/items/:delivery_id/unconfirm
///
/// A never-confirmed id is a no-op, not an error.
pub async fn unconfirm_delivery_item(
    State(state): State<Arc<AppState>>,
    Path(delivery_id): Path<u64>,
    Json(req): Json<UnconfirmItemRequest>,
) -> impl IntoResponse {
    match state
        .confirmations
        .unconfirm_delivery_item(delivery_id, &req.region)
        .await
    {
        Some(confirmation) => Json(DataResponse::new(confirmation)).into_response(),
        None => Json(MessageResponse::with_code(
            "Nothing to remove: delivery was not confirmed",
            "NO_OP",
        ))
        .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmFurnitureRequest {
    #[serde(rename = "typeMobilier")]
    pub furniture_type: FurnitureType,
    #[serde(rename = "nombreConfirme")]
    pub confirmed_count: i64,
    #[serde(rename = "responsable")]
    pub responsible: String,
    #[serde(rename = "commentaire", default)]
    pub comment: Option<String>,
}

/// POST /confirmations/:region/furniture
///
/// Sets (not increments) the confirmed count for one furniture type. The
/// count is validated here against the planned baseline quantity before it
/// reaches the workflow.
pub async fn confirm_furniture_type(
    State(state): State<Arc<AppState>>,
    Path(region): Path<String>,
    Json(req): Json<ConfirmFurnitureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.responsible.trim().is_empty() {
        return Err(ApiError::bad_request("A responsible party is required"));
    }
    if req.confirmed_count < 0 {
        return Err(ApiError::bad_request(
            "The confirmed count cannot be negative",
        ));
    }

    let baseline = state.inventory.baseline().await;
    let planned = baseline
        .get(&region)
        .and_then(|quantities| quantities.get(&req.furniture_type))
        .copied()
        .ok_or_else(|| {
            ApiError::bad_request(format!(
                "No planned stock for {} in region {region}",
                req.furniture_type
            ))
        })?;

    let confirmed_count = req.confirmed_count as u32;
    if confirmed_count > planned {
        return Err(ApiError::bad_request(format!(
            "The confirmed count ({confirmed_count}) cannot exceed the planned total ({planned})"
        )));
    }

    let confirmation = state
        .confirmations
        .confirm_furniture_type(
            &region,
            req.furniture_type,
            confirmed_count,
            &req.responsible,
            req.comment.as_deref(),
        )
        .await;
    Ok(Json(DataResponse::new(confirmation)))
}
