//! Run configuration.
//!
//! A grading run is described by a small YAML file:
//!
//! ```yaml
//! students_file: students.csv
//! submissions_dir: submissions
//! answer_key_file: answer_key.txt
//! # optional
//! results_dir: submissions/results
//! submission_file: running-config.txt
//! pass_threshold: 50
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.
//! Output locations default to fixed names under `results_dir`, which itself
//! defaults to `<submissions_dir>/results`.

use crate::paths::ensure_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_SUBMISSION_FILE: &str = "config.txt";
pub const DEFAULT_PASS_THRESHOLD: f64 = 50.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("{field} '{path}' does not exist or has the wrong type")]
    MissingPath { field: &'static str, path: PathBuf },
    #[error("pass_threshold must be between 0 and 100, got {0}")]
    InvalidThreshold(f64),
    #[error("cannot create output directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },
}

fn default_submission_file() -> String {
    DEFAULT_SUBMISSION_FILE.to_string()
}

fn default_pass_threshold() -> f64 {
    DEFAULT_PASS_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraderConfig {
    pub students_file: PathBuf,
    pub submissions_dir: PathBuf,
    pub answer_key_file: PathBuf,
    #[serde(default)]
    pub results_dir: Option<PathBuf>,
    #[serde(default)]
    pub feedback_dir: Option<PathBuf>,
    #[serde(default)]
    pub general_feedback_file: Option<PathBuf>,
    #[serde(default)]
    pub grading_scheme_file: Option<PathBuf>,
    #[serde(default)]
    pub grades_csv_file: Option<PathBuf>,
    /// File graded for tasks that precede any `#[FILE: ...]` directive.
    #[serde(default = "default_submission_file")]
    pub submission_file: String,
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
}

impl GraderConfig {
    /// Config with the three required inputs and every default applied.
    pub fn new(
        students_file: impl Into<PathBuf>,
        submissions_dir: impl Into<PathBuf>,
        answer_key_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            students_file: students_file.into(),
            submissions_dir: submissions_dir.into(),
            answer_key_file: answer_key_file.into(),
            results_dir: None,
            feedback_dir: None,
            general_feedback_file: None,
            grading_scheme_file: None,
            grades_csv_file: None,
            submission_file: default_submission_file(),
            pass_threshold: default_pass_threshold(),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Reads a config file and resolves its relative paths against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        debug!(config = ?config, "run configuration loaded");
        Ok(config)
    }

    fn resolve_relative(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.students_file);
        resolve(&mut self.submissions_dir);
        resolve(&mut self.answer_key_file);
        for p in [
            &mut self.results_dir,
            &mut self.feedback_dir,
            &mut self.general_feedback_file,
            &mut self.grading_scheme_file,
            &mut self.grades_csv_file,
        ]
        .into_iter()
        .flatten()
        {
            resolve(p);
        }
    }

    /// Checks inputs exist and settings are in range. Creates nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = |field: &'static str, path: &Path| ConfigError::MissingPath {
            field,
            path: path.to_path_buf(),
        };
        if !self.students_file.is_file() {
            return Err(missing("students_file", &self.students_file));
        }
        if !self.answer_key_file.is_file() {
            return Err(missing("answer_key_file", &self.answer_key_file));
        }
        if !self.submissions_dir.is_dir() {
            return Err(missing("submissions_dir", &self.submissions_dir));
        }
        if !(0.0..=100.0).contains(&self.pass_threshold) {
            return Err(ConfigError::InvalidThreshold(self.pass_threshold));
        }
        Ok(())
    }

    /// Creates the results and feedback directories if missing.
    pub fn prepare_output_dirs(&self) -> Result<(), ConfigError> {
        for dir in [self.results_dir(), self.feedback_dir()] {
            ensure_dir(&dir).map_err(|source| ConfigError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        info!(results_dir = %self.results_dir().display(), "output directories ready");
        Ok(())
    }

    pub fn results_dir(&self) -> PathBuf {
        self.results_dir
            .clone()
            .unwrap_or_else(|| self.submissions_dir.join("results"))
    }

    pub fn feedback_dir(&self) -> PathBuf {
        self.feedback_dir
            .clone()
            .unwrap_or_else(|| self.results_dir().join("feedback"))
    }

    pub fn general_feedback_file(&self) -> PathBuf {
        self.general_feedback_file
            .clone()
            .unwrap_or_else(|| self.results_dir().join("general_feedback.yaml"))
    }

    pub fn grading_scheme_file(&self) -> PathBuf {
        self.grading_scheme_file
            .clone()
            .unwrap_or_else(|| self.results_dir().join("grading_scheme.yaml"))
    }

    pub fn grades_csv_file(&self) -> PathBuf {
        self.grades_csv_file
            .clone()
            .unwrap_or_else(|| self.results_dir().join("grades.csv"))
    }
}
