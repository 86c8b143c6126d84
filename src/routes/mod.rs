pub mod api;
pub mod health;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/view", get(api::get_view))
        .route("/profile", get(api::get_profile))
        .route("/profile/reset", post(api::reset_profile))
        .route("/reset", post(api::reset_all))
        .route("/rooms/{room_id}", get(api::get_room))
}
