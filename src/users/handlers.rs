use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{ProfileResponse, RegisterProfileRequest, UpdateProfileRequest};
use crate::users::repo::UserProfile;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_measurements(height_cm: f64, weight_kg: f64, age: i32) -> Result<(), ApiError> {
    if height_cm <= 0.0 {
        return Err(ApiError::Invalid("height_cm must be positive".into()));
    }
    if weight_kg <= 0.0 {
        return Err(ApiError::Invalid("weight_kg must be positive".into()));
    }
    if age <= 0 {
        return Err(ApiError::Invalid("age must be positive".into()));
    }
    Ok(())
}

/// POST /users
#[instrument(skip(state, payload))]
pub async fn register_profile(
    State(state): State<AppState>,
    Json(payload): Json<RegisterProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::Invalid("invalid email".into()));
    }
    validate_measurements(payload.height_cm, payload.weight_kg, payload.age)?;

    if state.profiles.get(&email).await?.is_some() {
        warn!(%email, "profile already registered");
        return Err(ApiError::AlreadyExists(email));
    }

    let profile = UserProfile {
        email,
        height_cm: payload.height_cm,
        weight_kg: payload.weight_kg,
        age: payload.age,
        physical_activity: payload.physical_activity,
        gender: payload.gender,
        comorbidities: payload.comorbidities,
        preferences: payload.preferences,
    };
    state
        .profiles
        .create(&profile)
        .await
        .map_err(|e| ApiError::Persistence(e.to_string()))?;

    info!(email = %profile.email, "profile registered");
    Ok((StatusCode::CREATED, Json(profile.into())))
}

/// PUT /users/:email, full replacement.
#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::Invalid("invalid email".into()));
    }
    validate_measurements(payload.height_cm, payload.weight_kg, payload.age)?;

    let profile = UserProfile {
        email: email.clone(),
        height_cm: payload.height_cm,
        weight_kg: payload.weight_kg,
        age: payload.age,
        physical_activity: payload.physical_activity,
        gender: payload.gender,
        comorbidities: payload.comorbidities,
        preferences: payload.preferences,
    };
    let updated = state
        .profiles
        .update(&profile)
        .await
        .map_err(|e| ApiError::Persistence(e.to_string()))?;
    if !updated {
        return Err(ApiError::ProfileNotFound(email));
    }

    info!(email = %profile.email, "profile updated");
    Ok(Json(profile.into()))
}

/// GET /users/:email
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let email = email.trim().to_lowercase();
    let profile = state
        .profiles
        .get(&email)
        .await?
        .ok_or(ApiError::ProfileNotFound(email))?;
    Ok(Json(profile.into()))
}

/// GET /users
#[instrument(skip(state))]
pub async fn list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProfileResponse>>, ApiError> {
    let profiles = state.profiles.list().await?;
    Ok(Json(profiles.into_iter().map(ProfileResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.domain.org"));
    }

    #[test]
    fn email_validation_rejects_junk() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn measurements_must_be_positive() {
        assert!(validate_measurements(170.0, 70.0, 30).is_ok());
        assert!(validate_measurements(0.0, 70.0, 30).is_err());
        assert!(validate_measurements(170.0, -1.0, 30).is_err());
        assert!(validate_measurements(170.0, 70.0, 0).is_err());
    }
}
