//! Delivery record routes
//!
//! CRUD over the delivery collection plus the mark-delivered and
//! reset-to-initial transitions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::catalog::{is_known_personnel_type, is_known_region};
use crate::domain::{CreateDeliveryRequest, UpdateDeliveryRequest};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Region filter; "Toutes" (or omission) returns everything.
    pub region: Option<String>,
}

/// GET /deliveries
pub async fn list_deliveries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let records = match params.region.as_deref() {
        Some(region) => state.store.get_by_region(region),
        None => state.store.get_all(),
    };
    Json(DataResponse::new(records))
}

/// POST /deliveries
pub async fn create_delivery(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDeliveryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.region.trim().is_empty() {
        return Err(ApiError::bad_request("Region must not be empty"));
    }
    // Off-catalog values are accepted (field data is messy) but logged.
    if !is_known_region(&req.region) {
        tracing::warn!(region = %req.region, "Creating delivery for a region outside the catalog");
    }
    if !req.personnel_type.is_empty() && !is_known_personnel_type(&req.personnel_type) {
        tracing::warn!(
            personnel_type = %req.personnel_type,
            "Creating delivery with a personnel type outside the catalog"
        );
    }

    let record = state.store.create(req).await;
    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

/// POST /deliveries/bulk
pub async fn create_deliveries_bulk(
    State(state): State<Arc<AppState>>,
    Json(requests): Json<Vec<CreateDeliveryRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    if requests.is_empty() {
        return Err(ApiError::bad_request("Empty delivery batch"));
    }

    let created = state.store.create_many(requests).await;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

/// PUT /deliveries/:id
pub async fn update_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateDeliveryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .store
        .update(id, req)
        .await
        .ok_or_else(|| ApiError::not_found(format!("No delivery record with id {id}")))?;
    Ok(Json(DataResponse::new(record)))
}

/// DELETE /deliveries/:id
pub async fn delete_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.delete(id).await {
        return Err(ApiError::not_found(format!("No delivery record with id {id}")));
    }
    Ok(Json(MessageResponse::new("Delivery record deleted")))
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkDeliveredRequest {
    #[serde(rename = "dateLivraison", default)]
    pub delivery_date: Option<NaiveDate>,
}

/// POST /deliveries/:id/deliver
pub async fn mark_delivered(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<MarkDeliveredRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let date = req.delivery_date.unwrap_or_else(|| Local::now().date_naive());
    let record = state
        .store
        .mark_delivered(id, date)
        .await
        .ok_or_else(|| ApiError::not_found(format!("No delivery record with id {id}")))?;
    Ok(Json(DataResponse::new(record)))
}

/// POST /deliveries/:id/reset
pub async fn reset_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .store
        .reset_to_initial(id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("No delivery record with id {id}")))?;
    Ok(Json(DataResponse::new(record)))
}
