//! # Submission Evaluator
//!
//! Applies a compiled [`GradingScheme`] to one student's submission.
//!
//! Every gradable line is bound to the student, compiled and handed to a
//! [`SubmissionComparator`]. Lines are scored independently and strictly
//! all-or-nothing. Student-level problems never escape this module: a missing
//! placeholder value or an unreadable submission is turned into a zero score plus
//! an [`Annotation`] on the returned [`StudentFeedback`].

use crate::binder::{VariableBinding, bind};
use crate::error::SubmissionUnavailableError;
use crate::instantiator::instantiate;
use crate::scheme::{GradableLine, GradingScheme, Task};
use crate::scorer::{lab_totals, percentage, task_totals};
use crate::template::render_text;
use crate::traits::comparator::SubmissionComparator;
use crate::types::{
    Annotation, AnnotationKind, GradingStatus, LineResult, Student, StudentFeedback, TaskResult,
};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

/// Prefix marking an unmet condition in line messages.
pub const MISSING_PREFIX: &str = "Missing: ";
/// Prefix for lines disabled by an uncompilable pattern.
pub const PATTERN_ERROR_PREFIX: &str = "Pattern error: ";
/// Prefix for lines of a student that could not be graded at all.
pub const NOT_GRADED_PREFIX: &str = "Not graded: ";

/// The text of one student's submission files, as handed over by the file-access layer.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    files: BTreeMap<Option<String>, Result<String, SubmissionUnavailableError>>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// A submission consisting of the default file only.
    pub fn single(text: impl Into<String>) -> Self {
        Self::new().with_file(None, Ok(text.into()))
    }

    pub fn with_file(
        mut self,
        file: Option<&str>,
        text: Result<String, SubmissionUnavailableError>,
    ) -> Self {
        self.insert(file, text);
        self
    }

    pub fn insert(&mut self, file: Option<&str>, text: Result<String, SubmissionUnavailableError>) {
        self.files.insert(file.map(str::to_string), text);
    }

    /// The usable text for `file`. Whitespace-only files count as unavailable.
    pub fn text_for(
        &self,
        username: &str,
        file: Option<&str>,
    ) -> Result<&str, SubmissionUnavailableError> {
        let unavailable = |reason: &str| SubmissionUnavailableError {
            username: username.to_string(),
            file: file.map(str::to_string),
            reason: reason.to_string(),
        };
        match self.files.get(&file.map(str::to_string)) {
            None => Err(unavailable("File not provided")),
            Some(Err(err)) => Err(err.clone()),
            Some(Ok(text)) if text.trim().is_empty() => Err(unavailable("Submission is empty")),
            Some(Ok(text)) => Ok(text.as_str()),
        }
    }
}

fn line_result(
    line: &GradableLine,
    binding: &VariableBinding,
    matched: bool,
    message: String,
) -> LineResult {
    LineResult {
        position: line.position,
        label: line.label(binding),
        matched,
        awarded: if matched { line.points } else { 0.0 },
        possible: line.points,
        message,
    }
}

fn evaluate_line(
    task: &Task,
    line: &GradableLine,
    binding: &VariableBinding,
    submission_lines: &[&str],
    comparator: &dyn SubmissionComparator,
) -> LineResult {
    if let Some(defect) = &line.defect {
        return line_result(line, binding, false, format!("{PATTERN_ERROR_PREFIX}{defect}"));
    }

    let matched = match instantiate(task.number, line, binding) {
        Ok(matcher) => comparator.compare(&matcher, submission_lines),
        Err(err) => {
            // Probed at compile time, so this only happens for hand-built schemes.
            warn!(error = %err, "pattern failed to compile during evaluation");
            return line_result(line, binding, false, format!("{PATTERN_ERROR_PREFIX}{}", err.message));
        }
    };

    let message = if matched {
        line.label(binding)
    } else {
        format!("{MISSING_PREFIX}{}", line.failure_message(binding))
    };
    debug!(task = task.number, line = line.position, matched, "line evaluated");
    line_result(line, binding, matched, message)
}

fn task_result(task: &Task, binding: &VariableBinding, lines: Vec<LineResult>) -> TaskResult {
    let (earned, possible) = task_totals(&lines);
    TaskResult {
        number: task.number,
        name: render_text(&task.title, binding),
        lines,
        earned,
        possible,
    }
}

/// Scores one task against the submission lines.
pub fn evaluate_task(
    task: &Task,
    binding: &VariableBinding,
    submission_lines: &[&str],
    comparator: &dyn SubmissionComparator,
) -> TaskResult {
    let lines = task
        .lines
        .iter()
        .map(|line| evaluate_line(task, line, binding, submission_lines, comparator))
        .collect();
    task_result(task, binding, lines)
}

/// A task where nothing could be checked: every line unmatched, 0 points.
fn zero_task(task: &Task, binding: &VariableBinding, prefix: &str) -> TaskResult {
    let lines = task
        .lines
        .iter()
        .map(|line| {
            let message = format!("{prefix}{}", line.failure_message(binding));
            line_result(line, binding, false, message)
        })
        .collect();
    task_result(task, binding, lines)
}

fn finish(
    scheme: &GradingScheme,
    student: &Student,
    status: GradingStatus,
    tasks: Vec<TaskResult>,
    annotations: Vec<Annotation>,
) -> StudentFeedback {
    let (earned, _) = lab_totals(&tasks);
    let possible = scheme.total_points();
    StudentFeedback {
        student: student.clone(),
        status,
        percentage: percentage(earned, possible),
        tasks,
        earned,
        possible,
        graded_at: Utc::now(),
        annotations,
    }
}

/// Feedback for a student who could not be graded at all.
pub fn skipped_feedback(
    scheme: &GradingScheme,
    student: &Student,
    annotation: Annotation,
) -> StudentFeedback {
    let binding = VariableBinding::default();
    let tasks = scheme
        .tasks
        .iter()
        .map(|task| zero_task(task, &binding, NOT_GRADED_PREFIX))
        .collect();
    finish(scheme, student, GradingStatus::Skipped, tasks, vec![annotation])
}

/// Evaluates every task of `scheme` for one student.
pub fn evaluate(
    scheme: &GradingScheme,
    student: &Student,
    submission: &Submission,
    comparator: &dyn SubmissionComparator,
) -> StudentFeedback {
    let binding = match bind(student, &scheme.placeholders()) {
        Ok(binding) => binding,
        Err(err) => {
            warn!(username = %student.username, error = %err, "skipping student");
            return skipped_feedback(
                scheme,
                student,
                Annotation {
                    kind: AnnotationKind::MissingVariable,
                    message: err.to_string(),
                },
            );
        }
    };

    let mut tasks = Vec::with_capacity(scheme.tasks.len());
    let mut annotations = Vec::new();
    let mut unavailable: Vec<Option<String>> = Vec::new();
    let mut any_available = false;

    for task in &scheme.tasks {
        match submission.text_for(&student.username, task.file.as_deref()) {
            Ok(text) => {
                any_available = true;
                let lines: Vec<&str> = text.lines().collect();
                tasks.push(evaluate_task(task, &binding, &lines, comparator));
            }
            Err(err) => {
                if !unavailable.contains(&task.file) {
                    error!(username = %student.username, error = %err, "submission unavailable");
                    annotations.push(Annotation {
                        kind: AnnotationKind::SubmissionUnavailable,
                        message: err.to_string(),
                    });
                    unavailable.push(task.file.clone());
                }
                tasks.push(zero_task(task, &binding, MISSING_PREFIX));
            }
        }
    }

    let status = if any_available {
        GradingStatus::Graded
    } else {
        GradingStatus::Skipped
    };
    finish(scheme, student, status, tasks, annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparators::search_comparator::SearchComparator;
    use crate::parsers::answer_key_parser::compile_scheme;

    const KEY: &str = "\
(3 Points) Router
    (1) hostname R1-{UID}
    #[DETAIL: R1 - hostname set to {UID}]
    (2) interface g0/0 &&
        ip address 10.{UID}.0.1 255.255.255.0
(2 Points) Security
    (1) enable secret
    #[FEEDBACK: enable secret is not configured]
    (1) /^line vty 0 (4|15)$/
";

    const FULL: &str = "\
line vty 0 4
 password cisco
enable secret 5 $1$abc
!
interface g0/0
 ip address 10.7.0.1   255.255.255.0
hostname R1-7
";

    fn student() -> Student {
        Student::new("jdoe", Some("7"))
    }

    fn run(text: &str) -> StudentFeedback {
        let scheme = compile_scheme(KEY).unwrap();
        evaluate(&scheme, &student(), &Submission::single(text), &SearchComparator)
    }

    #[test]
    fn test_full_submission_in_any_order_scores_everything() {
        let fb = run(FULL);
        assert_eq!(fb.status, GradingStatus::Graded);
        assert_eq!(fb.earned, 5.0);
        assert_eq!(fb.possible, 5.0);
        assert_eq!(fb.percentage, 100.0);
        assert!(fb.annotations.is_empty());
        assert_eq!(fb.tasks[0].lines[0].message, "R1 - hostname set to 7");
    }

    #[test]
    fn test_missing_one_line_loses_exactly_its_points() {
        let fb = run(&FULL.replace("enable secret 5 $1$abc\n", ""));
        assert_eq!(fb.earned, 4.0);
        let missed: Vec<_> = fb.tasks[1].missed_lines().collect();
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].position, 1);
        assert_eq!(missed[0].message, "Missing: enable secret is not configured");
    }

    #[test]
    fn test_composite_needs_all_operands() {
        let fb = run(&FULL.replace(" ip address 10.7.0.1   255.255.255.0\n", ""));
        let line = &fb.tasks[0].lines[1];
        assert!(!line.matched);
        assert_eq!(line.awarded, 0.0);
        assert_eq!(line.possible, 2.0);
        assert_eq!(
            line.message,
            "Missing: interface g0/0 && ip address 10.7.0.1 255.255.255.0"
        );
    }

    #[test]
    fn test_other_students_values_do_not_match() {
        let fb = run(&FULL.replace("R1-7", "R1-8"));
        assert!(!fb.tasks[0].lines[0].matched);
        assert_eq!(fb.tasks[0].earned, 2.0);
    }

    #[test]
    fn test_missing_variable_skips_with_annotation() {
        let scheme = compile_scheme(KEY).unwrap();
        let fb = evaluate(
            &scheme,
            &Student::new("nouid", None),
            &Submission::single(FULL),
            &SearchComparator,
        );
        assert!(fb.is_skipped());
        assert!(fb.has_annotation(AnnotationKind::MissingVariable));
        assert!(fb.tasks.iter().all(|t| t.earned == 0.0));
        assert_eq!(fb.tasks.len(), 2);
        assert!(fb.tasks[0].lines[0].message.starts_with(NOT_GRADED_PREFIX));
    }

    #[test]
    fn test_unreadable_submission_gives_zero_feedback() {
        let scheme = compile_scheme(KEY).unwrap();
        let submission = Submission::new().with_file(
            None,
            Err(SubmissionUnavailableError {
                username: "jdoe".into(),
                file: None,
                reason: "File not found".into(),
            }),
        );
        let fb = evaluate(&scheme, &student(), &submission, &SearchComparator);
        assert!(fb.is_skipped());
        assert_eq!(fb.earned, 0.0);
        assert_eq!(fb.possible, 5.0);
        assert_eq!(fb.annotations.len(), 1);
        assert_eq!(fb.annotations[0].kind, AnnotationKind::SubmissionUnavailable);
    }

    #[test]
    fn test_empty_submission_counts_as_unavailable() {
        let fb = run("  \n\t\n");
        assert!(fb.is_skipped());
        assert!(fb.annotations[0].message.contains("Submission is empty"));
    }

    #[test]
    fn test_multi_file_partial_availability() {
        let key = "\
#[FILE: R1.txt]
(1 Points) R1
    (1) hostname R1
#[FILE: S1.txt]
(1 Points) S1
    (1) hostname S1
(1 Points) S1 vlan
    (1) vlan 10
";
        let scheme = compile_scheme(key).unwrap();
        let submission = Submission::new().with_file(Some("R1.txt"), Ok("hostname R1".into()));
        let fb = evaluate(&scheme, &student(), &submission, &SearchComparator);
        assert_eq!(fb.status, GradingStatus::Graded);
        assert_eq!(fb.earned, 1.0);
        assert_eq!(fb.possible, 3.0);
        // one annotation per unavailable file, not per task
        assert_eq!(fb.annotations.len(), 1);
        assert!(fb.annotations[0].message.contains("S1.txt"));
    }

    #[test]
    fn test_defective_line_scores_zero_without_annotation() {
        let scheme = compile_scheme("(2 Points) T\n(1) /([bad/\n(1) hostname").unwrap();
        let fb = evaluate(&scheme, &student(), &Submission::single("hostname R1"), &SearchComparator);
        assert_eq!(fb.earned, 1.0);
        assert!(fb.tasks[0].lines[0].message.starts_with(PATTERN_ERROR_PREFIX));
        assert!(fb.annotations.is_empty());
    }

    #[test]
    fn test_task_title_placeholders_are_rendered() {
        let scheme = compile_scheme("(1 Points) Router R{UID}\n(1) hostname").unwrap();
        let fb = evaluate(&scheme, &student(), &Submission::single("hostname"), &SearchComparator);
        assert_eq!(fb.tasks[0].name, "Router R7");
    }
}
