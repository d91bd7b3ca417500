use tracing::warn;

use crate::error::ApiError;
use crate::judge::{Ranking, RecommendationCandidate};
use crate::scans::repo::ScanRecord;
use crate::scans::services::UNKNOWN_PRODUCT;
use crate::state::AppState;

/// Rank the candidate pool for one user and return the judge's top picks.
///
/// Unlike scan evaluation this path reports failures honestly: a missing
/// profile, a pool below the configured minimum and a judge failure are all
/// distinct errors. A wrong recommendation is worse than none.
pub async fn recommend(
    st: &AppState,
    email: &str,
    pool: Vec<ScanRecord>,
) -> Result<Ranking, ApiError> {
    let profile = st
        .profiles
        .get(email)
        .await?
        .ok_or_else(|| ApiError::ProfileNotFound(email.to_string()))?;

    let min = st.config.evaluation.min_ranking_candidates;
    if pool.len() < min {
        return Err(ApiError::InsufficientData { min });
    }

    let candidates = normalize_candidates(st, pool).await;
    st.judge
        .rank(&profile, &candidates)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))
}

/// Turn raw history rows into judge input. Rows without a stored display
/// name get one re-resolved best-effort; a failed lookup falls back to the
/// unknown-product sentinel and never aborts the batch.
async fn normalize_candidates(st: &AppState, pool: Vec<ScanRecord>) -> Vec<RecommendationCandidate> {
    let mut candidates = Vec::with_capacity(pool.len());
    for record in pool {
        let product_name = match record.product_name.clone().filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => match st.products.lookup_facts(&record.upc).await {
                Ok(facts) => facts
                    .product_name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
                Err(e) => {
                    warn!(upc = %record.upc, error = %e, "name lookup failed while building candidates");
                    UNKNOWN_PRODUCT.to_string()
                }
            },
        };
        candidates.push(RecommendationCandidate {
            product_name,
            upc: record.upc,
            score: record.score,
            image_url: record.image_url,
            reasoning: record.reasoning,
        });
    }
    candidates
}
