// Quiz engine modules

pub mod engine;
pub mod runner;
pub mod scorer;

pub use engine::{Effect, QuizEvent, QuizPhase, QuizSession, QuizSettings, QuizSummary, TimerId};
pub use runner::{QuizCommand, QuizRunner, RunOutcome};
pub use scorer::Scorer;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    /// The question feed could not be fetched or decoded. The player may retry.
    #[error("question data unavailable: {0}")]
    DataUnavailable(String),
    #[error("choice {choice} is out of range for a question with {choices} choices")]
    InvalidSelection { choice: usize, choices: usize },
}

impl QuizError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuizError::DataUnavailable(_))
    }
}
