pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scans", post(handlers::evaluate_scan))
        .route("/users/:email/history", get(handlers::get_history))
}
