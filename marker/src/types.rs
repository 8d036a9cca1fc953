//! # Types Module
//!
//! This module defines the student record and the result structures produced
//! when a submission is marked: [`LineResult`] per gradable line, [`TaskResult`]
//! per task and [`StudentFeedback`] per student.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A student as loaded from the roster. Read-only for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub username: String,
    pub uid: Option<String>,
    /// Any other roster columns, keyed by lowercase column name.
    #[serde(default, flatten)]
    pub variables: BTreeMap<String, String>,
}

impl Student {
    pub fn new(username: impl Into<String>, uid: Option<&str>) -> Self {
        Self {
            username: username.into(),
            uid: uid.map(str::to_string),
            variables: BTreeMap::new(),
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables
            .insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Value for a placeholder name such as `UID`, `USERNAME` or `IP`.
    pub fn lookup(&self, placeholder: &str) -> Option<&str> {
        match placeholder {
            "UID" => self.uid.as_deref(),
            "USERNAME" => Some(self.username.as_str()),
            other => self
                .variables
                .get(&other.to_lowercase())
                .map(String::as_str),
        }
    }
}

/// Outcome of one gradable line for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineResult {
    pub position: usize,
    /// Human-readable description of the line (detail text or rendered expression).
    pub label: String,
    pub matched: bool,
    pub awarded: f64,
    pub possible: f64,
    /// Detail when matched, `Missing: ...` when not.
    pub message: String,
}

/// Outcome of one task for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    pub number: usize,
    pub name: String,
    pub lines: Vec<LineResult>,
    pub earned: f64,
    pub possible: f64,
}

impl TaskResult {
    pub fn missed_lines(&self) -> impl Iterator<Item = &LineResult> {
        self.lines.iter().filter(|l| !l.matched)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingStatus {
    Graded,
    /// Not graded at all; counted in the run but excluded from score sums.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnnotationKind {
    #[serde(rename = "MissingVariableError")]
    MissingVariable,
    #[serde(rename = "SubmissionUnavailableError")]
    SubmissionUnavailable,
    #[serde(rename = "InternalError")]
    Internal,
}

/// An error recorded against one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub message: String,
}

/// Everything the grader concluded about one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentFeedback {
    pub student: Student,
    pub status: GradingStatus,
    pub tasks: Vec<TaskResult>,
    pub earned: f64,
    pub possible: f64,
    pub percentage: f64,
    pub graded_at: DateTime<Utc>,
    pub annotations: Vec<Annotation>,
}

impl StudentFeedback {
    pub fn is_skipped(&self) -> bool {
        self.status == GradingStatus::Skipped
    }

    pub fn has_annotation(&self, kind: AnnotationKind) -> bool {
        self.annotations.iter().any(|a| a.kind == kind)
    }
}
