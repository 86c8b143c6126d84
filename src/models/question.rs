use serde::{Deserialize, Serialize};

/// A single multiple-choice question as delivered by the question feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    pub choices: Vec<String>,
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Identifier of the sign shown alongside the question (emoji or media key)
    #[serde(default, alias = "signImage", skip_serializing_if = "Option::is_none")]
    pub sign_media: Option<String>,
}

impl Question {
    /// Check the structural rules a loaded question must satisfy
    pub fn validate(&self) -> Result<(), String> {
        if self.choices.len() < 2 {
            return Err(format!(
                "question '{}' has {} choices, at least 2 are required",
                self.text,
                self.choices.len()
            ));
        }
        if self.correct_index >= self.choices.len() {
            return Err(format!(
                "question '{}' has correctIndex {} but only {} choices",
                self.text,
                self.correct_index,
                self.choices.len()
            ));
        }
        Ok(())
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_index
    }
}
