use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Failures surfaced at the API boundary.
///
/// Scan evaluation never returns these; it degrades instead. Everything
/// else (profiles, history reads, recommendations) reports honestly.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no profile registered for {0}")]
    ProfileNotFound(String),
    #[error("a profile already exists for {0}")]
    AlreadyExists(String),
    #[error("not enough scan history to rank: at least {min} scanned products are required")]
    InsufficientData { min: usize },
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::ProfileNotFound(_) => "not_found",
            ApiError::AlreadyExists(_) => "already_exists",
            ApiError::InsufficientData { .. } => "insufficient_data",
            ApiError::Upstream(_) => "upstream_failure",
            ApiError::Persistence(_) => "persistence_failure",
            ApiError::Invalid(_) => "invalid_request",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::ProfileNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();
        if status.is_server_error() {
            error!(%code, %message, "request failed");
        } else {
            warn!(%code, %message, "request rejected");
        }
        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}
