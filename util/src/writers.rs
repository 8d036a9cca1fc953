//! Output writers.
//!
//! Every file is written to a `.tmp` sibling first and renamed into place, so a
//! crashed run never leaves a half-written report behind.

use crate::paths::{ensure_parent_dir, temp_path};
use marker::report::GradeRow;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot write '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("cannot serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("cannot serialize CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("cannot finish CSV output: {0}")]
    CsvFlush(String),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> WriteError + '_ {
    move |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `bytes` to `path` via a temp file and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    ensure_parent_dir(path).map_err(io_error(path))?;
    let tmp = temp_path(path);
    {
        let mut f = fs::File::create(&tmp).map_err(io_error(&tmp))?;
        f.write_all(bytes).map_err(io_error(&tmp))?;
        f.flush().map_err(io_error(&tmp))?;
    }
    fs::rename(&tmp, path).map_err(io_error(path))?;
    debug!(path = %path.display(), bytes = bytes.len(), "file written");
    Ok(())
}

pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), WriteError> {
    let text = serde_yaml::to_string(value)?;
    write_atomic(path, text.as_bytes())
}

/// Writes `username,earned_points` rows in the given order. The header is written
/// even when there are no rows.
pub fn write_grades_csv(path: &Path, rows: &[GradeRow]) -> Result<(), WriteError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(["username", "earned_points"])?;
    for row in rows {
        writer.write_record([row.username.clone(), row.earned_points.to_string()])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| WriteError::CsvFlush(e.to_string()))?;
    write_atomic(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        lab: String,
        total: f64,
    }

    #[test]
    fn test_write_yaml_creates_parents_and_leaves_no_temp() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("results").join("general_feedback.yaml");
        let value = Sample {
            lab: "Lab 3".into(),
            total: 5.0,
        };
        write_yaml(&path, &value).unwrap();

        let back: Sample = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, value);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_atomic_replaces_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.txt");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_grades_csv_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grades.csv");
        let rows = vec![
            GradeRow {
                username: "zed".into(),
                earned_points: 4.5,
            },
            GradeRow {
                username: "amy".into(),
                earned_points: 0.0,
            },
        ];
        write_grades_csv(&path, &rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "username,earned_points");
        assert_eq!(lines[1], "zed,4.5");
        assert_eq!(lines[2], "amy,0");
    }

    #[test]
    fn test_empty_grades_keeps_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grades.csv");
        write_grades_csv(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "username,earned_points\n");
    }
}
