use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::{env, time::Duration};

use crate::quiz::{
    engine::{QUESTION_TIME_BUDGET, SETTLE_DELAY},
    QuizSettings,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub questions: QuestionsConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_dir: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub enum QuestionFeed {
    Http { url: String },
    File { path: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionsConfig {
    pub feed: QuestionFeed,
    pub default_stage: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Seconds per question
    pub question_time_budget: u32,
    pub settle_delay_ms: u64,
}

impl GameConfig {
    pub fn quiz_settings(&self) -> QuizSettings {
        QuizSettings {
            time_budget: self.question_time_budget,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }
}

/// Stage ids travel in socket query strings, so they are kept to
/// ASCII letters, digits, `-` and `_`.
pub fn is_valid_stage_id(stage_id: &str) -> bool {
    !stage_id.is_empty()
        && stage_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let server = ServerConfig {
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a number")?,
            frontend_dir: env::var("FRONTEND_DIR")
                .unwrap_or_else(|_| "./frontend".to_string()),
        };

        let feed = match env::var("QUESTIONS_URL") {
            Ok(url) if !url.trim().is_empty() => QuestionFeed::Http { url },
            _ => QuestionFeed::File {
                path: env::var("QUESTIONS_PATH")
                    .unwrap_or_else(|_| "./questions.json".to_string()),
            },
        };

        let default_stage = env::var("DEFAULT_STAGE").unwrap_or_else(|_| "stage1".to_string());
        ensure!(
            is_valid_stage_id(&default_stage),
            "DEFAULT_STAGE '{}' may only contain letters, digits, '-' and '_'",
            default_stage
        );
        let questions = QuestionsConfig {
            feed,
            default_stage,
        };

        let game = GameConfig {
            question_time_budget: env::var("QUESTION_TIME_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|seconds| *seconds > 0)
                .unwrap_or(QUESTION_TIME_BUDGET),
            settle_delay_ms: env::var("SETTLE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(SETTLE_DELAY.as_millis() as u64),
        };

        Ok(Config {
            server,
            questions,
            game,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
