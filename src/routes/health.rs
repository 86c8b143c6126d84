use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let sessions: Vec<Value> = state
        .active_sessions
        .iter()
        .map(|entry| {
            json!({
                "stage_id": entry.stage_id,
                "elapsed_secs": entry.started_at.elapsed().as_secs(),
            })
        })
        .collect();

    Json(json!({
        "status": "ok",
        "service": "sign-quest",
        "version": env!("CARGO_PKG_VERSION"),
        "active_sessions": sessions.len(),
        "sessions": sessions,
    }))
}
