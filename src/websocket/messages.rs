use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quiz::engine::QuestionView;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Select { choice: usize },
    Skip,
    /// Navigating away from the quiz; ends the session
    Leave,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SessionStarted {
        session_id: Uuid,
        stage_id: String,
    },
    Question {
        question: QuestionView,
    },
    Tick {
        time_remaining: u32,
    },
    AnswerResult {
        choice: usize,
        correct: bool,
        score: u32,
    },
    QuizCompleted {
        score: u32,
        correct_answers: u32,
        total_questions: usize,
        level: u32,
        experience: u32,
        games_played: u32,
    },
    Error {
        message: String,
        retryable: bool,
    },
}
