use crate::{
    models::{Room, UserProfile},
    views::{View, ViewContext, ViewRouter},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub path: Option<String>,
}

/// Render the view for a location, e.g. `/api/view?path=/home`
pub async fn get_view(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<View>, StatusCode> {
    let mut router = ViewRouter::new();
    router.navigate(query.path.as_deref().unwrap_or("/"));

    let ctx = ViewContext {
        profiles: &state.profiles,
        rooms: &state.rooms,
        default_stage: &state.config.questions.default_stage,
    };

    router.render_current(&ctx).map(Json).map_err(|e| {
        tracing::error!("Failed to render {}: {}", router.current().path(), e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserProfile>, StatusCode> {
    state.profiles.get_or_init().map(Json).map_err(|e| {
        tracing::error!("Failed to load profile: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Forget the player's progress
pub async fn reset_profile(State(state): State<Arc<AppState>>) -> StatusCode {
    state.profiles.reset();
    StatusCode::NO_CONTENT
}

/// Drop every stored record (profile and rooms)
pub async fn reset_all(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.store.is_empty() {
        tracing::debug!("Reset requested on an empty store");
        return StatusCode::NO_CONTENT;
    }
    let records = state.store.len();
    state.store.clear();
    tracing::info!("Cleared {} stored records", records);
    StatusCode::NO_CONTENT
}

pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, StatusCode> {
    state.rooms.get_or_create(&room_id).map(Json).map_err(|e| {
        tracing::error!("Failed to load room {}: {}", room_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
