//! Grades a whole roster against one compiled scheme.
//!
//! Each student's load and evaluation runs on the tokio blocking pool. Handles are
//! awaited in roster order and folded into a single [`RunAggregate`], so the output
//! order and the statistics do not depend on scheduling.

use crate::MarkingJob;
use crate::error::MarkerError;
use crate::evaluator::{Submission, skipped_feedback};
use crate::scheme::GradingScheme;
use crate::scorer::{RunAggregate, RunSummary};
use crate::traits::comparator::SubmissionComparator;
use crate::traits::source::SubmissionSource;
use crate::types::{Annotation, AnnotationKind, Student, StudentFeedback};
use std::sync::Arc;
use tracing::{error, info};

/// Everything a run produced, in roster order.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub feedback: Vec<StudentFeedback>,
    pub summary: RunSummary,
}

/// Reads every file the scheme references for one student.
pub fn load_submission(
    scheme: &GradingScheme,
    student: &Student,
    source: &dyn SubmissionSource,
) -> Submission {
    let mut submission = Submission::new();
    for file in scheme.files() {
        submission.insert(file.as_deref(), source.load(student, file.as_deref()));
    }
    submission
}

/// Marks every student with `comparator` and folds the results into run statistics.
pub async fn grade_students(
    scheme: Arc<GradingScheme>,
    students: Vec<Student>,
    source: Arc<dyn SubmissionSource>,
    comparator: Arc<dyn SubmissionComparator>,
    pass_threshold: f64,
) -> RunOutcome {
    info!(
        students = students.len(),
        tasks = scheme.tasks.len(),
        lines = scheme.line_count(),
        "grading started"
    );

    let handles: Vec<_> = students
        .iter()
        .cloned()
        .map(|student| {
            let scheme = Arc::clone(&scheme);
            let source = Arc::clone(&source);
            let comparator = Arc::clone(&comparator);
            tokio::task::spawn_blocking(move || {
                MarkingJob::from_source(&scheme, &student, source.as_ref())
                    .with_comparator(comparator)
                    .mark()
            })
        })
        .collect();

    let mut aggregate = RunAggregate::new(&scheme, pass_threshold);
    let mut feedback = Vec::with_capacity(students.len());

    for (student, handle) in students.iter().zip(handles) {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => {
                error!(username = %student.username, error = %err, "grading task failed");
                skipped_feedback(
                    &scheme,
                    student,
                    Annotation {
                        kind: AnnotationKind::Internal,
                        message: MarkerError::TaskFailed(student.username.clone(), err.to_string())
                            .to_string(),
                    },
                )
            }
        };
        info!(
            username = %result.student.username,
            earned = result.earned,
            possible = result.possible,
            status = ?result.status,
            "student graded"
        );
        aggregate.fold(&result);
        feedback.push(result);
    }

    let summary = aggregate.finalize();
    info!(
        graded = summary.graded_students,
        skipped = summary.skipped_students,
        "grading finished"
    );
    RunOutcome { feedback, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparators::search_comparator::SearchComparator;
    use crate::instantiator::ConcreteMatcher;
    use crate::parsers::answer_key_parser::compile_scheme;
    use crate::scorer::DEFAULT_PASS_THRESHOLD;
    use crate::traits::source::InMemorySource;
    use crate::types::GradingStatus;

    const KEY: &str = "\
(2 Points) Basics
    (1) hostname R{UID}
    (1) service password-encryption
";

    #[tokio::test]
    async fn test_grades_roster_in_order() {
        let scheme = Arc::new(compile_scheme(KEY).unwrap());
        let students = vec![
            Student::new("c", Some("3")),
            Student::new("a", Some("1")),
            Student::new("b", None),
            Student::new("d", Some("4")),
        ];
        let source = InMemorySource::new()
            .with("c", None, "hostname R3\nservice password-encryption")
            .with("a", None, "hostname R9")
            .with("b", None, "hostname R");

        let outcome = grade_students(
            scheme,
            students,
            Arc::new(source),
            Arc::new(SearchComparator),
            DEFAULT_PASS_THRESHOLD,
        )
        .await;

        let order: Vec<_> = outcome.feedback.iter().map(|f| f.student.username.as_str()).collect();
        assert_eq!(order, ["c", "a", "b", "d"]);
        assert_eq!(outcome.feedback[0].earned, 2.0);
        assert_eq!(outcome.feedback[1].earned, 0.0);
        assert_eq!(outcome.feedback[1].status, GradingStatus::Graded);
        assert!(outcome.feedback[2].has_annotation(AnnotationKind::MissingVariable));
        assert!(outcome.feedback[3].has_annotation(AnnotationKind::SubmissionUnavailable));

        let summary = outcome.summary;
        assert_eq!(summary.total_students, 4);
        assert_eq!(summary.graded_students, 2);
        assert_eq!(summary.skipped_students, 2);
        assert_eq!(summary.passing_students, 1);
        assert_eq!(summary.average_score, 1.0);
        assert_eq!(summary.pass_rate, 0.25);
    }

    #[tokio::test]
    async fn test_empty_roster() {
        let scheme = Arc::new(compile_scheme(KEY).unwrap());
        let outcome = grade_students(
            scheme,
            vec![],
            Arc::new(InMemorySource::new()),
            Arc::new(SearchComparator),
            50.0,
        )
        .await;
        assert!(outcome.feedback.is_empty());
        assert_eq!(outcome.summary.total_students, 0);
    }

    struct NeverMatches;

    impl SubmissionComparator for NeverMatches {
        fn compare(&self, _matcher: &ConcreteMatcher, _submission_lines: &[&str]) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_run_uses_given_comparator() {
        let scheme = Arc::new(compile_scheme(KEY).unwrap());
        let source =
            InMemorySource::new().with("a", None, "hostname R1\nservice password-encryption");
        let outcome = grade_students(
            scheme,
            vec![Student::new("a", Some("1"))],
            Arc::new(source),
            Arc::new(NeverMatches),
            DEFAULT_PASS_THRESHOLD,
        )
        .await;
        assert_eq!(outcome.feedback[0].status, GradingStatus::Graded);
        assert_eq!(outcome.feedback[0].earned, 0.0);
        assert_eq!(outcome.summary.passing_students, 0);
    }

    #[test]
    fn test_load_submission_reads_each_file_once() {
        let scheme = compile_scheme("#[FILE: R1.txt]\n(1 Points) A\n(1) a\n(1 Points) B\n(1) b").unwrap();
        let source = InMemorySource::new().with("u", Some("R1.txt"), "a\nb");
        let sub = load_submission(&scheme, &Student::new("u", None), &source);
        assert_eq!(sub.text_for("u", Some("R1.txt")).unwrap(), "a\nb");
        assert!(sub.text_for("u", None).is_err());
    }
}
