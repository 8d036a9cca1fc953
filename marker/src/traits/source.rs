//! Submission Source Trait
//!
//! The marker never reads files itself. A [`SubmissionSource`] hands it the text of
//! one student's submission file, or explains why that file is unavailable.

use crate::error::SubmissionUnavailableError;
use crate::types::Student;
use std::collections::HashMap;

pub trait SubmissionSource: Send + Sync {
    /// Loads `file` for `student`. `None` names the default submission file.
    fn load(
        &self,
        student: &Student,
        file: Option<&str>,
    ) -> Result<String, SubmissionUnavailableError>;
}

/// In-memory source keyed by `(username, file)`. Handy for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    texts: HashMap<(String, Option<String>), String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, username: &str, file: Option<&str>, text: impl Into<String>) -> Self {
        self.texts.insert(
            (username.to_string(), file.map(str::to_string)),
            text.into(),
        );
        self
    }
}

impl SubmissionSource for InMemorySource {
    fn load(
        &self,
        student: &Student,
        file: Option<&str>,
    ) -> Result<String, SubmissionUnavailableError> {
        self.texts
            .get(&(student.username.clone(), file.map(str::to_string)))
            .cloned()
            .ok_or_else(|| SubmissionUnavailableError {
                username: student.username.clone(),
                file: file.map(str::to_string),
                reason: "File not found".to_string(),
            })
    }
}
