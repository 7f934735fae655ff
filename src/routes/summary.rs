//! Dashboard summary route

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::response::DataResponse;
use crate::app::AppState;

/// GET /summary
///
/// Current derived snapshot: overall progress plus the per-region,
/// per-personnel and per-furniture breakdowns.
pub async fn get_summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(DataResponse::new(state.store.summary()))
}
