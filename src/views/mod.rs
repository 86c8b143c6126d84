use serde::Serialize;

use crate::{
    models::{room::DEFAULT_ROOM_ID, Feature, Room, UserProfile},
    profile::ProfileService,
    rooms::RoomService,
    store::StoreError,
};

/// Simulation stages shown in the stage list. Only the first is playable.
const SIMULATION_STAGES: u32 = 3;

/// Every screen the game can show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Welcome,
    Home,
    Quiz,
    Simulation,
    Multiplayer,
    Profile,
    NotFound(String),
}

impl Route {
    /// Resolve a location such as `#/home` or `/quiz/` to a route
    pub fn parse(path: &str) -> Self {
        let path = path.trim().trim_start_matches('#');
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        match path {
            "/" => Route::Welcome,
            "/home" => Route::Home,
            "/quiz" => Route::Quiz,
            "/simulation" => Route::Simulation,
            "/multiplayer" => Route::Multiplayer,
            "/profile" => Route::Profile,
            other => Route::NotFound(other.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Welcome => "/",
            Route::Home => "/home",
            Route::Quiz => "/quiz",
            Route::Simulation => "/simulation",
            Route::Multiplayer => "/multiplayer",
            Route::Profile => "/profile",
            Route::NotFound(path) => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageTile {
    pub number: u32,
    pub locked: bool,
}

/// Data for one rendered screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Welcome,
    Home {
        profile: UserProfile,
        tiles: Vec<String>,
    },
    /// Entry point of a quiz; the session itself runs over the socket
    Quiz {
        stage_id: String,
        socket_path: String,
    },
    Simulation {
        stages: Vec<StageTile>,
    },
    Multiplayer {
        room: Room,
    },
    Profile {
        profile: UserProfile,
    },
    FeatureLocked {
        feature: Feature,
    },
    NotFound {
        path: String,
    },
}

/// Services a view may read while rendering
pub struct ViewContext<'a> {
    pub profiles: &'a ProfileService,
    pub rooms: &'a RoomService,
    pub default_stage: &'a str,
}

/// Tracks the current location and renders it
#[derive(Debug, Clone)]
pub struct ViewRouter {
    current: Route,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self {
            current: Route::Welcome,
        }
    }
}

impl ViewRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    pub fn navigate(&mut self, path: &str) -> &Route {
        self.current = Route::parse(path);
        tracing::debug!("Navigated to {}", self.current.path());
        &self.current
    }

    /// Render the whole view for the current location
    pub fn render_current(&self, ctx: &ViewContext<'_>) -> Result<View, StoreError> {
        render(&self.current, ctx)
    }
}

pub fn render(route: &Route, ctx: &ViewContext<'_>) -> Result<View, StoreError> {
    let view = match route {
        Route::Welcome => View::Welcome,
        Route::Home => View::Home {
            profile: ctx.profiles.get_or_init()?,
            tiles: [Route::Quiz, Route::Simulation, Route::Multiplayer]
                .iter()
                .map(|r| r.path().to_string())
                .collect(),
        },
        Route::Quiz => View::Quiz {
            stage_id: ctx.default_stage.to_string(),
            socket_path: format!("/ws?stage={}", ctx.default_stage),
        },
        Route::Simulation => {
            if !ctx.profiles.get_or_init()?.has_feature(Feature::Simulation) {
                return Ok(View::FeatureLocked {
                    feature: Feature::Simulation,
                });
            }
            View::Simulation {
                stages: (1..=SIMULATION_STAGES)
                    .map(|number| StageTile {
                        number,
                        locked: number > 1,
                    })
                    .collect(),
            }
        }
        Route::Multiplayer => {
            if !ctx.profiles.get_or_init()?.has_feature(Feature::Multiplayer) {
                return Ok(View::FeatureLocked {
                    feature: Feature::Multiplayer,
                });
            }
            View::Multiplayer {
                room: ctx.rooms.get_or_create(DEFAULT_ROOM_ID)?,
            }
        }
        Route::Profile => View::Profile {
            profile: ctx.profiles.get_or_init()?,
        },
        Route::NotFound(path) => View::NotFound { path: path.clone() },
    };
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{profile::PROFILE_KEY, store::MemoryDb};
    use std::sync::Arc;

    fn services() -> (Arc<MemoryDb>, ProfileService, RoomService) {
        let store = Arc::new(MemoryDb::new());
        (
            store.clone(),
            ProfileService::new(store.clone()),
            RoomService::new(store),
        )
    }

    #[test]
    fn test_parse_known_routes() {
        assert_eq!(Route::parse("/"), Route::Welcome);
        assert_eq!(Route::parse(""), Route::Welcome);
        assert_eq!(Route::parse("#/"), Route::Welcome);
        assert_eq!(Route::parse("#/home"), Route::Home);
        assert_eq!(Route::parse("/quiz/"), Route::Quiz);
        assert_eq!(Route::parse("/simulation"), Route::Simulation);
        assert_eq!(Route::parse("/multiplayer"), Route::Multiplayer);
        assert_eq!(Route::parse("/profile"), Route::Profile);
    }

    #[test]
    fn test_parse_unknown_route() {
        assert_eq!(
            Route::parse("#/community"),
            Route::NotFound("/community".to_string())
        );
    }

    #[test]
    fn test_path_round_trips_through_parse() {
        for route in [
            Route::Welcome,
            Route::Home,
            Route::Quiz,
            Route::Simulation,
            Route::Multiplayer,
            Route::Profile,
        ] {
            assert_eq!(Route::parse(route.path()), route);
        }
    }

    #[test]
    fn test_router_starts_on_welcome_and_navigates() {
        let (_, profiles, rooms) = services();
        let ctx = ViewContext {
            profiles: &profiles,
            rooms: &rooms,
            default_stage: "stage1",
        };
        let mut router = ViewRouter::new();
        assert_eq!(router.render_current(&ctx).unwrap(), View::Welcome);

        router.navigate("#/quiz");
        assert_eq!(
            router.render_current(&ctx).unwrap(),
            View::Quiz {
                stage_id: "stage1".to_string(),
                socket_path: "/ws?stage=stage1".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_path_renders_not_found() {
        let (_, profiles, rooms) = services();
        let ctx = ViewContext {
            profiles: &profiles,
            rooms: &rooms,
            default_stage: "stage1",
        };
        let mut router = ViewRouter::new();
        router.navigate("/nowhere");
        assert_eq!(
            router.render_current(&ctx).unwrap(),
            View::NotFound {
                path: "/nowhere".to_string()
            }
        );
    }

    #[test]
    fn test_simulation_has_one_open_stage() {
        let (_, profiles, rooms) = services();
        let ctx = ViewContext {
            profiles: &profiles,
            rooms: &rooms,
            default_stage: "stage1",
        };
        let View::Simulation { stages } = render(&Route::Simulation, &ctx).unwrap() else {
            panic!("expected simulation view");
        };
        assert_eq!(stages.iter().filter(|s| !s.locked).count(), 1);
        assert!(!stages[0].locked);
    }

    #[test]
    fn test_multiplayer_persists_room_between_visits() {
        let (_, profiles, rooms) = services();
        let ctx = ViewContext {
            profiles: &profiles,
            rooms: &rooms,
            default_stage: "stage1",
        };
        let first = render(&Route::Multiplayer, &ctx).unwrap();
        let second = render(&Route::Multiplayer, &ctx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_locked_feature_renders_locked_view() {
        let (store, profiles, rooms) = services();
        let mut profile = profiles.get_or_init().unwrap();
        profile.unlocked_features.remove(&Feature::Multiplayer);
        store.save(PROFILE_KEY, &profile).unwrap();

        let ctx = ViewContext {
            profiles: &profiles,
            rooms: &rooms,
            default_stage: "stage1",
        };
        assert_eq!(
            render(&Route::Multiplayer, &ctx).unwrap(),
            View::FeatureLocked {
                feature: Feature::Multiplayer
            }
        );
    }

    #[test]
    fn test_home_shows_profile_progress() {
        let (_, profiles, rooms) = services();
        profiles.award_experience(60).unwrap();
        let ctx = ViewContext {
            profiles: &profiles,
            rooms: &rooms,
            default_stage: "stage1",
        };
        let View::Home { profile, tiles } = render(&Route::Home, &ctx).unwrap() else {
            panic!("expected home view");
        };
        assert_eq!(profile.level, 2);
        assert_eq!(tiles, vec!["/quiz", "/simulation", "/multiplayer"]);
    }
}
