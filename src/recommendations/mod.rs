pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users/:email/recommendations",
        get(handlers::get_recommendations),
    )
}
