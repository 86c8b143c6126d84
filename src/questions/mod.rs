use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;

use crate::{models::Question, quiz::QuizError};

/// Source of question sets, keyed by stage id
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Load the ordered questions of a stage.
    ///
    /// An unknown stage yields an empty list. A feed that cannot be fetched
    /// or decoded yields `QuizError::DataUnavailable`.
    async fn load_stage(&self, stage_id: &str) -> Result<Vec<Question>, QuizError>;
}

/// Decode a feed document and pick out one stage.
///
/// Only the requested stage is decoded, so a broken record elsewhere in the
/// feed does not make this stage unavailable.
pub fn parse_stage(document: &[u8], stage_id: &str) -> Result<Vec<Question>, QuizError> {
    let mut stages: HashMap<String, serde_json::Value> = serde_json::from_slice(document)
        .map_err(|e| QuizError::DataUnavailable(format!("malformed question feed: {}", e)))?;

    let Some(stage) = stages.remove(stage_id) else {
        tracing::debug!("Stage '{}' not present in question feed", stage_id);
        return Ok(Vec::new());
    };

    let questions: Vec<Question> = serde_json::from_value(stage).map_err(|e| {
        QuizError::DataUnavailable(format!("malformed stage '{}': {}", stage_id, e))
    })?;

    for question in &questions {
        question.validate().map_err(QuizError::DataUnavailable)?;
    }
    Ok(questions)
}

/// Reads the question feed from a JSON file on disk
pub struct FileQuestionSource {
    path: PathBuf,
}

impl FileQuestionSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl QuestionSource for FileQuestionSource {
    async fn load_stage(&self, stage_id: &str) -> Result<Vec<Question>, QuizError> {
        let content = fs::read(&self.path).await.map_err(|e| {
            tracing::warn!("Failed to read question feed {}: {}", self.path.display(), e);
            QuizError::DataUnavailable(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let questions = parse_stage(&content, stage_id)?;
        tracing::info!(
            "Loaded {} questions for stage '{}' from {}",
            questions.len(),
            stage_id,
            self.path.display()
        );
        Ok(questions)
    }
}

/// Fetches the question feed over HTTP
pub struct HttpQuestionSource {
    url: String,
    http_client: reqwest::Client,
}

impl HttpQuestionSource {
    pub fn new(url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http_client,
        }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn load_stage(&self, stage_id: &str) -> Result<Vec<Question>, QuizError> {
        let unavailable = |e: reqwest::Error| {
            tracing::warn!("Question feed fetch from {} failed: {}", self.url, e);
            QuizError::DataUnavailable(format!("fetch failed: {}", e))
        };

        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(unavailable)?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("Question feed {} answered {}", self.url, status);
            return Err(QuizError::DataUnavailable(format!(
                "question feed returned status {}",
                status
            )));
        }

        let body = response.bytes().await.map_err(unavailable)?;
        parse_stage(&body, stage_id)
    }
}

/// In-memory question feed
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct StaticQuestionSource {
    stages: HashMap<String, Vec<Question>>,
}

#[cfg(test)]
impl StaticQuestionSource {
    pub fn with_stage(mut self, stage_id: impl Into<String>, questions: Vec<Question>) -> Self {
        self.stages.insert(stage_id.into(), questions);
        self
    }
}

#[cfg(test)]
#[async_trait]
impl QuestionSource for StaticQuestionSource {
    async fn load_stage(&self, stage_id: &str) -> Result<Vec<Question>, QuizError> {
        Ok(self.stages.get(stage_id).cloned().unwrap_or_default())
    }
}
