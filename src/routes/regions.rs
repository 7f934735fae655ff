//! Region reconciliation routes
//!
//! Planned-vs-delivered-vs-confirmed status rows and the per-region CSV
//! report.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::services::{reconciliation, transfer};

#[derive(Debug, Default, Deserialize)]
pub struct StatusParams {
    pub region: Option<String>,
}

/// GET /regions/status
///
/// One row per baseline region, re-derived from the current delivery,
/// baseline and confirmation state on every call.
pub async fn region_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatusParams>,
) -> impl IntoResponse {
    let baseline = state.inventory.baseline().await;
    let records = state.store.get_all();
    let confirmations = state.confirmations.get_all();

    let rows = reconciliation::region_delivery_status(
        &records,
        &baseline,
        &confirmations,
        params.region.as_deref(),
    );
    Json(DataResponse::new(rows))
}

/// GET /regions/:region/report.csv
pub async fn region_report_csv(
    State(state): State<Arc<AppState>>,
    Path(region): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.store.get_all();
    let csv = transfer::export_region_csv(&records, &region)?;

    let filename = format!("livraisons_{}.csv", region.replace(' ', "_"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}
