//! # Feedback Report Module
//!
//! This module defines the serializable records written out after a marking run and
//! the pure functions that build them from grading results.
//!
//! ## Overview
//!
//! - [`FeedbackReport`]: one student's feedback file (course, lab grade, per-task results).
//! - [`GeneralFeedbackReport`]: run-wide statistics for the lecturer.
//! - [`GradeRow`]: one line of the grades export.
//!
//! ## Example Output
//!
//! A student report serializes as:
//!
//! ```yaml
//! course:
//!   course_name: CNET 101
//!   professor: Dr. Smith
//! lab:
//!   lab_name: Lab 3
//!   graded_on: Mon 06 Oct 2025 10:00:00 UTC
//!   earned_points: 4.0
//!   total_points: 5.0
//!   lab_grade: 80.0%
//! student:
//!   username: jdoe
//!   uid: '7'
//! status: graded
//! feedback:
//! - task: Router
//!   earned: 3.0
//!   total: 3.0
//!   results:
//!   - R1 - hostname set to 7
//! ```
//!
//! ## Design Notes
//!
//! - Nothing here touches the filesystem; `util::writers` does the I/O.
//! - Percentages are rounded half up to one decimal place by [`round1`].

use crate::error::PatternCompileError;
use crate::scheme::GradingScheme;
use crate::scorer::RunSummary;
use crate::types::{Annotation, GradingStatus, Student, StudentFeedback};
use chrono::{DateTime, Utc};
use serde::Serialize;

const GRADED_ON_FORMAT: &str = "%a %d %b %Y %H:%M:%S UTC";

/// Rounds half up to one decimal place.
///
/// A small epsilon absorbs binary representation error, so `66.65` becomes `66.7`.
pub fn round1(value: f64) -> f64 {
    (value * 10.0 + 0.5 + 1e-9).floor() / 10.0
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats a percentage as `"80.0%"`.
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", round1(value))
}

/// Identifies the lab a run belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    pub course: String,
    pub lab: String,
    pub professor: String,
    pub graded_on: DateTime<Utc>,
}

impl RunMetadata {
    /// Metadata from the answer key, with `lab_fallback` used when no `#[LAB:]` is given.
    pub fn from_scheme(scheme: &GradingScheme, lab_fallback: &str, graded_on: DateTime<Utc>) -> Self {
        let meta = &scheme.metadata;
        Self {
            course: meta.course.clone().unwrap_or_default(),
            lab: meta.lab.clone().unwrap_or_else(|| lab_fallback.to_string()),
            professor: meta.professor.clone().unwrap_or_default(),
            graded_on,
        }
    }

    pub fn graded_on_text(&self) -> String {
        self.graded_on.format(GRADED_ON_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseInfo {
    pub course_name: String,
    pub professor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabInfo {
    pub lab_name: String,
    pub graded_on: String,
    pub earned_points: f64,
    pub total_points: f64,
    pub lab_grade: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskFeedback {
    pub task: String,
    pub earned: f64,
    pub total: f64,
    /// One message per gradable line, in order.
    pub results: Vec<String>,
}

/// A single student's feedback file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackReport {
    pub course: CourseInfo,
    pub lab: LabInfo,
    pub student: Student,
    pub status: GradingStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Annotation>,
    pub feedback: Vec<TaskFeedback>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatistics {
    pub task: String,
    pub average_score: f64,
    pub average_percentage: String,
}

/// Run-wide statistics file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralFeedbackReport {
    pub course_name: String,
    pub lab_name: String,
    pub professor: String,
    pub graded_on: String,
    pub total_points: f64,
    pub total_students: usize,
    pub graded_students: usize,
    pub skipped_students: usize,
    pub passing_students: usize,
    pub pass_threshold: String,
    pub average_score: f64,
    pub average_percentage: String,
    pub pass_rate: f64,
    pub tasks: Vec<TaskStatistics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pattern_errors: Vec<PatternCompileError>,
}

/// One row of the grades export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeRow {
    pub username: String,
    pub earned_points: f64,
}

pub fn assemble_feedback(feedback: &StudentFeedback, meta: &RunMetadata) -> FeedbackReport {
    FeedbackReport {
        course: CourseInfo {
            course_name: meta.course.clone(),
            professor: meta.professor.clone(),
        },
        lab: LabInfo {
            lab_name: meta.lab.clone(),
            graded_on: meta.graded_on_text(),
            earned_points: feedback.earned,
            total_points: feedback.possible,
            lab_grade: format_percentage(feedback.percentage),
        },
        student: feedback.student.clone(),
        status: feedback.status,
        errors: feedback.annotations.clone(),
        feedback: feedback
            .tasks
            .iter()
            .map(|task| TaskFeedback {
                task: task.name.clone(),
                earned: task.earned,
                total: task.possible,
                results: task.lines.iter().map(|l| l.message.clone()).collect(),
            })
            .collect(),
    }
}

pub fn assemble_general_feedback(
    summary: &RunSummary,
    scheme: &GradingScheme,
    meta: &RunMetadata,
) -> GeneralFeedbackReport {
    GeneralFeedbackReport {
        course_name: meta.course.clone(),
        lab_name: meta.lab.clone(),
        professor: meta.professor.clone(),
        graded_on: meta.graded_on_text(),
        total_points: scheme.total_points(),
        total_students: summary.total_students,
        graded_students: summary.graded_students,
        skipped_students: summary.skipped_students,
        passing_students: summary.passing_students,
        pass_threshold: format_percentage(summary.pass_threshold),
        average_score: round2(summary.average_score),
        average_percentage: format_percentage(summary.average_percentage),
        pass_rate: round2(summary.pass_rate),
        tasks: summary
            .tasks
            .iter()
            .map(|t| TaskStatistics {
                task: t.name.clone(),
                average_score: round2(t.average_score),
                average_percentage: format_percentage(t.average_percentage),
            })
            .collect(),
        pattern_errors: summary.defects.clone(),
    }
}

/// Grade rows in the order the feedback was produced (roster order).
pub fn grade_rows(feedback: &[StudentFeedback]) -> Vec<GradeRow> {
    feedback
        .iter()
        .map(|f| GradeRow {
            username: f.student.username.clone(),
            earned_points: f.earned,
        })
        .collect()
}
