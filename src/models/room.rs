use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROOM_ID: &str = "room-1";
/// Seat names shown in the mock room ("you" and "guest")
pub const DEFAULT_PLAYERS: [&str; 2] = ["أنت", "ضيف"];

/// Mock multiplayer room. Only ever displayed, never played.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    pub players: Vec<String>,
    pub current_turn: String,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(room_id: impl Into<String>) -> Self {
        let players: Vec<String> = DEFAULT_PLAYERS.iter().map(|p| p.to_string()).collect();
        Self {
            room_id: room_id.into(),
            current_turn: players[0].clone(),
            players,
            created_at: Utc::now(),
        }
    }

    /// Store key the room is persisted under
    pub fn store_key(room_id: &str) -> String {
        format!("room:{}", room_id)
    }
}
