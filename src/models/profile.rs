use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_USER_ID: &str = "u1";
pub const DEFAULT_DISPLAY_NAME: &str = "لاعب";

/// Optional game areas a player can have access to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Simulation,
    Multiplayer,
}

impl Feature {
    pub const ALL: [Feature; 2] = [Feature::Simulation, Feature::Multiplayer];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    /// Always `experience / 50 + 1` after an experience gain
    pub level: u32,
    pub experience: u32,
    pub games_played: u32,
    pub unlocked_features: BTreeSet<Feature>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: DEFAULT_USER_ID.to_string(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            level: 1,
            experience: 0,
            games_played: 0,
            unlocked_features: Feature::ALL.into_iter().collect(),
        }
    }
}

impl UserProfile {
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.unlocked_features.contains(&feature)
    }
}
