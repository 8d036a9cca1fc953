//! Drives one grading run end to end: validate the run configuration, compile the
//! answer key, grade the roster and write every output file.

use anyhow::{Context, Result};
use chrono::Utc;
use marker::comparators::search_comparator::SearchComparator;
use marker::parsers::answer_key_parser::AnswerKeyParser;
use marker::report::{
    RunMetadata, assemble_feedback, assemble_general_feedback, grade_rows,
};
use marker::run::{RunOutcome, grade_students};
use marker::scheme::GradingScheme;
use marker::scorer::RunSummary;
use marker::traits::parser::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use util::config::GraderConfig;
use util::paths::feedback_path;
use util::roster::load_roster;
use util::submission_loader::FileSubmissionSource;
use util::writers::{write_grades_csv, write_yaml};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub course: String,
    pub lab: String,
    pub total_points: f64,
    pub summary: RunSummary,
    pub feedback_files: Vec<PathBuf>,
    pub results_dir: PathBuf,
}

/// Compiles the answer key named by `config`. Any format error halts the run.
pub fn load_scheme(config: &GraderConfig) -> Result<GradingScheme> {
    let path = &config.answer_key_file;
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read answer key '{}'", path.display()))?;
    let scheme = AnswerKeyParser
        .parse(text.as_str())
        .with_context(|| format!("answer key '{}' is invalid", path.display()))?;
    for defect in &scheme.defects {
        warn!(%defect, "gradable line disabled");
    }
    Ok(scheme)
}

pub async fn run(config: &GraderConfig) -> Result<RunReport> {
    config.validate()?;
    let scheme = Arc::new(load_scheme(config)?);
    config.prepare_output_dirs()?;
    write_yaml(&config.grading_scheme_file(), scheme.as_ref())?;

    let roster = load_roster(&config.students_file)?;
    let unsupplied = roster.unsupplied(scheme.placeholders());
    if !unsupplied.is_empty() {
        warn!(
            placeholders = %unsupplied.join(", "),
            "roster has no column for these placeholders, students will be skipped"
        );
    }
    let source = Arc::new(FileSubmissionSource::new(
        &config.submissions_dir,
        &config.submission_file,
    ));

    let outcome = grade_students(
        Arc::clone(&scheme),
        roster.students,
        source,
        Arc::new(SearchComparator),
        config.pass_threshold,
    )
    .await;

    let lab_fallback = config
        .answer_key_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("lab")
        .to_string();
    let meta = RunMetadata::from_scheme(&scheme, &lab_fallback, Utc::now());

    let results_dir = config.results_dir();
    let config = config.clone();
    let writer_scheme = Arc::clone(&scheme);
    let writer_meta = meta.clone();
    let summary = outcome.summary.clone();
    let feedback_files = tokio::task::spawn_blocking(move || {
        write_outputs(&config, &writer_scheme, &writer_meta, &outcome)
    })
    .await
    .context("output writer task failed")??;

    info!(files = feedback_files.len(), "feedback written");
    Ok(RunReport {
        course: meta.course,
        lab: meta.lab,
        total_points: scheme.total_points(),
        summary,
        feedback_files,
        results_dir,
    })
}

fn write_outputs(
    config: &GraderConfig,
    scheme: &GradingScheme,
    meta: &RunMetadata,
    outcome: &RunOutcome,
) -> Result<Vec<PathBuf>> {
    let feedback_dir = config.feedback_dir();
    let mut written = Vec::with_capacity(outcome.feedback.len());
    for feedback in &outcome.feedback {
        let path = feedback_path(&feedback_dir, &feedback.student.username, &meta.lab);
        write_yaml(&path, &assemble_feedback(feedback, meta))?;
        written.push(path);
    }

    let general = assemble_general_feedback(&outcome.summary, scheme, meta);
    write_yaml(&config.general_feedback_file(), &general)?;
    write_grades_csv(&config.grades_csv_file(), &grade_rows(&outcome.feedback))?;
    Ok(written)
}
