pub mod dto;
pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(handlers::list_profiles).post(handlers::register_profile),
        )
        .route(
            "/users/:email",
            get(handlers::get_profile).put(handlers::update_profile),
        )
}
