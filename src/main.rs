mod config;
mod models;
mod profile;
mod questions;
mod quiz;
mod rooms;
mod routes;
mod store;
mod views;
mod websocket;

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use config::{Config, QuestionFeed};
use dashmap::DashMap;
use profile::ProfileService;
use questions::{FileQuestionSource, HttpQuestionSource, QuestionSource};
use rooms::RoomService;
use store::MemoryDb;
use tokio::time::Instant;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// A quiz currently being played over a socket
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub stage_id: String,
    pub started_at: Instant,
}

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub store: Arc<MemoryDb>,
    pub profiles: ProfileService,
    pub rooms: RoomService,
    pub questions: Arc<dyn QuestionSource>,
    /// Open quiz sockets keyed by connection id
    pub active_sessions: DashMap<Uuid, ActiveSession>,
}

impl AppState {
    pub fn new(config: Config, questions: Arc<dyn QuestionSource>) -> Self {
        let store = Arc::new(MemoryDb::new());
        Self {
            config,
            profiles: ProfileService::new(store.clone()),
            rooms: RoomService::new(store.clone()),
            store,
            questions,
            active_sessions: DashMap::new(),
        }
    }
}

/// Build the question source selected by configuration
fn question_source(config: &Config) -> Result<Arc<dyn QuestionSource>> {
    let source: Arc<dyn QuestionSource> = match &config.questions.feed {
        QuestionFeed::Http { url } => {
            let http_client = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?;
            tracing::info!("Questions will be fetched from {}", url);
            Arc::new(HttpQuestionSource::new(url.clone(), http_client))
        }
        QuestionFeed::File { path } => {
            tracing::info!("Questions will be read from {}", path);
            Arc::new(FileQuestionSource::new(path))
        }
    };
    Ok(source)
}

/// API, socket and health routes without the static front-end
fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket endpoint
        .route("/ws", get(websocket::handle_websocket))
        // API routes
        .merge(routes::create_routes())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sign_quest=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sign Quest server...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let questions = question_source(&config)?;
    let state = Arc::new(AppState::new(config.clone(), questions));

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Serve frontend static files
    let frontend_service = ServeDir::new(&config.server.frontend_dir);

    let app = api_router(state)
        .fallback_service(frontend_service)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Quiz socket: ws://{}/ws?stage={}", addr, config.questions.default_stage);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
