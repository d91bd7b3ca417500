use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::judge::Ranking;
use crate::state::AppState;

use super::services;

/// GET /users/:email/recommendations
///
/// The candidate pool is every stored scan across all users; the ranking is
/// personalized to the profile in the path.
#[instrument(skip(state))]
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Ranking>, ApiError> {
    let email = email.trim().to_lowercase();
    let pool = state.history.list_all().await?;
    let ranking = services::recommend(&state, &email, pool).await?;
    Ok(Json(ranking))
}
