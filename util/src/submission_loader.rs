//!
//! Submission Loader
//!
//! Reads student submission files from disk for the marker. A file for student
//! `jdoe` named `R1.txt` lives at `<submissions_dir>/jdoe-R1.txt`; tasks without a
//! `#[FILE: ...]` directive use the configured default file name.
//!
//! Failures are returned as [`SubmissionUnavailableError`] with a short reason; the
//! full path and OS error are logged here.

use crate::paths::submission_path;
use marker::error::SubmissionUnavailableError;
use marker::traits::source::SubmissionSource;
use marker::types::Student;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Maximum accepted size for a single submission file.
pub const MAX_SUBMISSION_SIZE: u64 = 2 * 1024 * 1024; // 2MB

/// Checks that a file exists, is a file, and (optionally) does not exceed a maximum size.
///
/// Returns the short reason on failure.
fn check_file(path: &Path, max_size: Option<u64>) -> Result<(), &'static str> {
    if !path.exists() {
        error!("File not found: {}", path.display());
        return Err("File not found");
    }

    if !path.is_file() {
        error!("Not a file: {}", path.display());
        return Err("Invalid file type");
    }

    let metadata = fs::metadata(path).map_err(|e| {
        error!("File unreadable: {} - {}", path.display(), e);
        "File unreadable"
    })?;

    if let Some(max) = max_size {
        if metadata.len() > max {
            error!(
                "File too large: {} ({} bytes, max {} bytes)",
                path.display(),
                metadata.len(),
                max
            );
            return Err("File too large");
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct FileSubmissionSource {
    submissions_dir: PathBuf,
    default_file: String,
    max_size: Option<u64>,
}

impl FileSubmissionSource {
    pub fn new(submissions_dir: impl Into<PathBuf>, default_file: impl Into<String>) -> Self {
        Self {
            submissions_dir: submissions_dir.into(),
            default_file: default_file.into(),
            max_size: Some(MAX_SUBMISSION_SIZE),
        }
    }

    /// Override the size limit. `None` disables it.
    pub fn with_max_size(mut self, max_size: Option<u64>) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn path_for(&self, username: &str, file: Option<&str>) -> PathBuf {
        submission_path(
            &self.submissions_dir,
            username,
            file.unwrap_or(&self.default_file),
        )
    }
}

impl SubmissionSource for FileSubmissionSource {
    fn load(
        &self,
        student: &Student,
        file: Option<&str>,
    ) -> Result<String, SubmissionUnavailableError> {
        let path = self.path_for(&student.username, file);
        let unavailable = |reason: &str| SubmissionUnavailableError {
            username: student.username.clone(),
            file: Some(file.unwrap_or(&self.default_file).to_string()),
            reason: reason.to_string(),
        };

        check_file(&path, self.max_size).map_err(|reason| unavailable(reason))?;
        let bytes = fs::read(&path).map_err(|e| {
            error!("File unreadable: {} - {}", path.display(), e);
            unavailable("File unreadable")
        })?;

        debug!(path = %path.display(), bytes = bytes.len(), "submission loaded");
        // Device dumps occasionally carry stray non-UTF-8 bytes.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
