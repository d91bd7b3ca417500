use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::scans::dto::EvaluationResponse;
use crate::scans::repo::ScanRecord;
use crate::state::AppState;
use crate::users::repo::UserProfile;

/// Display name used when no source can provide one.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
/// Placeholder image shown when the page lookup fails.
pub const FALLBACK_IMAGE_URL: &str = "https://cdn-icons-png.flaticon.com/512/3724/3724788.png";
/// Midpoint score returned when an evaluation cannot be completed.
pub const NEUTRAL_SCORE: i32 = 50;

/// Evaluate one (email, upc) scan and always come back with a usable answer.
///
/// Each step degrades instead of failing: a repeat scan inside the dedup
/// window replays the stored result, an unregistered email gets a synthesized
/// default profile, a failed image lookup falls back to a placeholder, and a
/// failed facts or judge call yields a neutral verdict.
///
/// The dedup check and the insert are not atomic; two concurrent scans of the
/// same pair inside the window can both persist. Accepted for now.
pub async fn evaluate(st: &AppState, email: &str, upc: &str) -> EvaluationResponse {
    if let Some(previous) = recent_duplicate(st, email, upc).await {
        info!(%email, %upc, "repeat scan inside dedup window; replaying stored result");
        return previous;
    }

    let facts = st.products.lookup_facts(upc).await;
    let profile = resolve_profile(st, email).await;

    let verdict = match &facts {
        Ok(facts) => st.judge.score(&profile, facts).await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    let verdict = match verdict {
        Ok(verdict) => verdict,
        Err(cause) => {
            warn!(%email, %upc, %cause, "evaluation degraded to neutral fallback");
            return degraded(&cause);
        }
    };

    let image_url = match st.products.lookup_image_and_name(upc).await {
        Ok(media) => media.image_url,
        Err(e) => {
            warn!(%upc, error = %e, "image lookup failed; using placeholder");
            FALLBACK_IMAGE_URL.to_string()
        }
    };

    let product_name = facts
        .ok()
        .and_then(|f| f.product_name)
        .filter(|name| !name.is_empty());

    let record = ScanRecord::new(
        email.to_string(),
        upc.to_string(),
        verdict.score,
        verdict.reasoning.clone(),
        image_url.clone(),
        product_name.clone(),
    );
    if let Err(e) = st.history.append(&record).await {
        warn!(%email, %upc, error = %e, "failed to persist scan; returning result anyway");
    }

    EvaluationResponse {
        score: verdict.score,
        reasoning: verdict.reasoning,
        image_url,
        product_name: product_name.unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
    }
}

/// Load the profile for `email`, synthesizing (and best-effort persisting)
/// the neutral default when nobody registered it. Never fails.
async fn resolve_profile(st: &AppState, email: &str) -> UserProfile {
    match st.profiles.get(email).await {
        Ok(Some(profile)) => return profile,
        Ok(None) => info!(%email, "no profile registered; synthesizing default"),
        Err(e) => warn!(%email, error = %e, "profile read failed; falling back to default"),
    }
    let fallback = UserProfile::default_for(email);
    if let Err(e) = st.profiles.create(&fallback).await {
        warn!(%email, error = %e, "could not persist default profile; continuing in memory");
    }
    fallback
}

async fn recent_duplicate(st: &AppState, email: &str, upc: &str) -> Option<EvaluationResponse> {
    let history = match st.history.list_by_user(email).await {
        Ok(history) => history,
        Err(e) => {
            warn!(%email, error = %e, "history read failed; skipping dedup check");
            return None;
        }
    };
    let window = Duration::seconds(st.config.evaluation.dedup_window_secs);
    find_in_window(&history, upc, window, OffsetDateTime::now_utc()).map(replay)
}

/// First record for `upc` strictly younger than `window` at `now`. The
/// history is ordered most recent first, so the first hit is the freshest.
fn find_in_window<'a>(
    history: &'a [ScanRecord],
    upc: &str,
    window: Duration,
    now: OffsetDateTime,
) -> Option<&'a ScanRecord> {
    history
        .iter()
        .find(|record| record.upc == upc && now - record.scanned_at < window)
}

fn replay(record: &ScanRecord) -> EvaluationResponse {
    EvaluationResponse {
        score: record.score,
        reasoning: record.reasoning.clone(),
        image_url: record.image_url.clone(),
        product_name: record
            .product_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
    }
}

fn degraded(cause: &str) -> EvaluationResponse {
    EvaluationResponse {
        score: NEUTRAL_SCORE,
        reasoning: format!("Evaluation unavailable: {cause}"),
        image_url: FALLBACK_IMAGE_URL.to_string(),
        product_name: UNKNOWN_PRODUCT.to_string(),
    }
}
