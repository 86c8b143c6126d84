use std::sync::Arc;

use crate::{
    models::UserProfile,
    quiz::Scorer,
    store::{MemoryDb, StoreError},
};

/// Store key of the single player profile
pub const PROFILE_KEY: &str = "user";

/// Reads and writes the player profile kept in the store
#[derive(Debug, Clone)]
pub struct ProfileService {
    store: Arc<MemoryDb>,
}

impl ProfileService {
    pub fn new(store: Arc<MemoryDb>) -> Self {
        Self { store }
    }

    /// Return the stored profile, creating the default one on first access.
    /// An existing profile is never overwritten.
    pub fn get_or_init(&self) -> Result<UserProfile, StoreError> {
        if let Some(profile) = self.store.load::<UserProfile>(PROFILE_KEY) {
            return Ok(profile);
        }

        // Another caller may create it first; the entry lock keeps theirs
        let profile = self
            .store
            .update(PROFILE_KEY, UserProfile::default, |_| {})?;
        tracing::info!("Initialized profile {}", profile.id);
        Ok(profile)
    }

    /// Add experience for a finished game and recompute the level
    pub fn award_experience(&self, points: u32) -> Result<UserProfile, StoreError> {
        let profile = self
            .store
            .update(PROFILE_KEY, UserProfile::default, |profile| {
                profile.experience = profile.experience.saturating_add(points);
                profile.games_played = profile.games_played.saturating_add(1);
                profile.level = Scorer::level_for(profile.experience);
            })?;

        tracing::info!(
            "Awarded {} xp to {} (total {}, level {}, games {})",
            points,
            profile.id,
            profile.experience,
            profile.level,
            profile.games_played
        );
        Ok(profile)
    }

    /// Discard the stored profile. The next access starts from the default again.
    pub fn reset(&self) {
        self.store.remove(PROFILE_KEY);
        tracing::info!("Profile data reset");
    }
}
