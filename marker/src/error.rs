//! Marker Error Types
//!
//! This module defines the error taxonomy of the grader. Errors fall into two
//! groups:
//!
//! - **Scheme-level** errors ([`SchemeFormatError`], [`PatternCompileError`]) are
//!   authoring defects in the answer key. A malformed key halts the run before any
//!   student is processed; an uncompilable pattern only disables its own line.
//! - **Student-level** errors ([`MissingVariableError`], [`SubmissionUnavailableError`])
//!   are caught at the evaluator boundary and turned into feedback annotations.
//!
//! [`MarkerError`] wraps all of them for callers that only need a single error type.
//!
//! # Example
//!
//! ```rust
//! use marker::error::{MarkerError, SchemeFormatError};
//!
//! fn check(points: &str) -> Result<f64, MarkerError> {
//!     points
//!         .parse::<f64>()
//!         .map_err(|_| SchemeFormatError::new(1, format!("point value '{points}' is not numeric")).into())
//! }
//!
//! assert!(check("x").is_err());
//! ```

use serde::Serialize;
use thiserror::Error;

/// The answer key could not be compiled into a grading scheme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("answer key line {line}: {message}")]
pub struct SchemeFormatError {
    /// 1-based line number in the answer key (0 when the error concerns the key as a whole).
    pub line: usize,
    pub message: String,
}

impl SchemeFormatError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// A gradable line's expression does not compile into a regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("task {task} line {position}: cannot compile '{expression}': {message}")]
pub struct PatternCompileError {
    pub task: usize,
    pub position: usize,
    pub expression: String,
    pub message: String,
}

/// A placeholder used by the scheme has no value for this student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("student '{username}' has no value for {}", .variables.join(", "))]
pub struct MissingVariableError {
    pub username: String,
    pub variables: Vec<String>,
}

/// A submission file could not be read for this student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("submission '{}' for student '{username}' is unavailable: {reason}", .file.as_deref().unwrap_or("<default>"))]
pub struct SubmissionUnavailableError {
    pub username: String,
    pub file: Option<String>,
    pub reason: String,
}

/// Represents all error types that can occur in the marker system.
#[derive(Debug, Error)]
pub enum MarkerError {
    #[error(transparent)]
    SchemeFormat(#[from] SchemeFormatError),
    #[error(transparent)]
    PatternCompile(#[from] PatternCompileError),
    #[error(transparent)]
    MissingVariable(#[from] MissingVariableError),
    #[error(transparent)]
    SubmissionUnavailable(#[from] SubmissionUnavailableError),
    /// A student's grading task terminated abnormally.
    #[error("grading task for '{0}' failed: {1}")]
    TaskFailed(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_format_error_display() {
        let err = SchemeFormatError::new(7, "task has no gradable lines");
        assert_eq!(err.to_string(), "answer key line 7: task has no gradable lines");
    }

    #[test]
    fn test_missing_variable_lists_every_name() {
        let err = MissingVariableError {
            username: "jdoe".into(),
            variables: vec!["IP".into(), "UID".into()],
        };
        assert_eq!(err.to_string(), "student 'jdoe' has no value for IP, UID");
    }

    #[test]
    fn test_submission_unavailable_default_file() {
        let err = SubmissionUnavailableError {
            username: "jdoe".into(),
            file: None,
            reason: "File not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "submission '<default>' for student 'jdoe' is unavailable: File not found"
        );
    }

    #[test]
    fn test_marker_error_is_transparent() {
        let err: MarkerError = SchemeFormatError::new(0, "answer key defines no tasks").into();
        assert_eq!(err.to_string(), "answer key line 0: answer key defines no tasks");
    }
}
