use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

use super::dto::{EvaluateRequest, EvaluationResponse, HistoryItem};
use super::services;

/// POST /scans
///
/// Always answers 200 with an evaluation; upstream trouble surfaces as a
/// degraded result, not an error.
#[instrument(skip(state, payload), fields(email = %payload.email, upc = %payload.upc))]
pub async fn evaluate_scan(
    State(state): State<AppState>,
    Json(payload): Json<EvaluateRequest>,
) -> Json<EvaluationResponse> {
    let email = payload.email.trim().to_lowercase();
    let upc = payload.upc.trim();
    Json(services::evaluate(&state, &email, upc).await)
}

/// GET /users/:email/history
#[instrument(skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    let email = email.trim().to_lowercase();
    let records = state.history.list_by_user(&email).await?;
    Ok(Json(records.into_iter().map(HistoryItem::from).collect()))
}
