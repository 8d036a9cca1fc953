//! # Scorer Module
//!
//! This module turns line outcomes into task and lab totals, and folds per-student
//! feedback into run-wide statistics.
//!
//! Scoring is all-or-nothing per gradable line, so totals are plain sums. Run
//! statistics are accumulated in a [`RunAggregate`], which is order-independent:
//! aggregates built over disjoint sets of students can be merged in any order and
//! finalize to the same [`RunSummary`].

use crate::error::PatternCompileError;
use crate::scheme::GradingScheme;
use crate::types::{LineResult, StudentFeedback, TaskResult};
use serde::Serialize;

/// Default pass mark, as a percentage of the lab total.
pub const DEFAULT_PASS_THRESHOLD: f64 = 50.0;

const EPSILON: f64 = 1e-9;

/// Sums awarded and possible points over a task's lines.
pub fn task_totals(lines: &[LineResult]) -> (f64, f64) {
    lines
        .iter()
        .fold((0.0, 0.0), |(earned, possible), l| {
            (earned + l.awarded, possible + l.possible)
        })
}

/// Sums earned and possible points over a student's tasks.
///
/// # Example
///
/// ```
/// use marker::types::TaskResult;
/// use marker::scorer::lab_totals;
///
/// let tasks = vec![
///     TaskResult { number: 1, name: "Router".into(), lines: vec![], earned: 3.0, possible: 3.0 },
///     TaskResult { number: 2, name: "Switch".into(), lines: vec![], earned: 0.5, possible: 2.0 },
/// ];
/// assert_eq!(lab_totals(&tasks), (3.5, 5.0));
/// ```
pub fn lab_totals(tasks: &[TaskResult]) -> (f64, f64) {
    tasks
        .iter()
        .fold((0.0, 0.0), |(earned, possible), t| {
            (earned + t.earned, possible + t.possible)
        })
}

/// `earned / possible * 100`, or 0 when nothing is possible.
pub fn percentage(earned: f64, possible: f64) -> f64 {
    if possible > 0.0 {
        earned / possible * 100.0
    } else {
        0.0
    }
}

/// Running totals for one task across graded students.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskAggregate {
    pub number: usize,
    pub name: String,
    pub earned_sum: f64,
    pub possible_sum: f64,
    pub graded: usize,
}

/// Accumulates statistics for a marking run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunAggregate {
    pub pass_threshold: f64,
    pub total_students: usize,
    pub graded_students: usize,
    pub skipped_students: usize,
    pub passing_students: usize,
    pub earned_sum: f64,
    pub possible_sum: f64,
    pub tasks: Vec<TaskAggregate>,
    pub defects: Vec<PatternCompileError>,
}

impl RunAggregate {
    pub fn new(scheme: &GradingScheme, pass_threshold: f64) -> Self {
        Self {
            pass_threshold,
            total_students: 0,
            graded_students: 0,
            skipped_students: 0,
            passing_students: 0,
            earned_sum: 0.0,
            possible_sum: 0.0,
            tasks: scheme
                .tasks
                .iter()
                .map(|t| TaskAggregate {
                    number: t.number,
                    name: t.title.clone(),
                    earned_sum: 0.0,
                    possible_sum: 0.0,
                    graded: 0,
                })
                .collect(),
            defects: scheme.defects.clone(),
        }
    }

    /// Adds one student's feedback. Skipped students are counted but do not
    /// contribute to any score sum.
    pub fn fold(&mut self, feedback: &StudentFeedback) {
        self.total_students += 1;
        if feedback.is_skipped() {
            self.skipped_students += 1;
            return;
        }

        self.graded_students += 1;
        self.earned_sum += feedback.earned;
        self.possible_sum += feedback.possible;
        if feedback.percentage + EPSILON >= self.pass_threshold {
            self.passing_students += 1;
        }

        for result in &feedback.tasks {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.number == result.number) {
                task.earned_sum += result.earned;
                task.possible_sum += result.possible;
                task.graded += 1;
            }
        }
    }

    /// Combines two aggregates built from disjoint sets of students.
    pub fn merge(mut self, other: RunAggregate) -> RunAggregate {
        self.total_students += other.total_students;
        self.graded_students += other.graded_students;
        self.skipped_students += other.skipped_students;
        self.passing_students += other.passing_students;
        self.earned_sum += other.earned_sum;
        self.possible_sum += other.possible_sum;
        for theirs in other.tasks {
            match self.tasks.iter_mut().find(|t| t.number == theirs.number) {
                Some(ours) => {
                    ours.earned_sum += theirs.earned_sum;
                    ours.possible_sum += theirs.possible_sum;
                    ours.graded += theirs.graded;
                }
                None => self.tasks.push(theirs),
            }
        }
        self
    }

    pub fn finalize(&self) -> RunSummary {
        let per_graded = |sum: f64, graded: usize| {
            if graded == 0 { 0.0 } else { sum / graded as f64 }
        };

        RunSummary {
            total_students: self.total_students,
            graded_students: self.graded_students,
            skipped_students: self.skipped_students,
            passing_students: self.passing_students,
            pass_threshold: self.pass_threshold,
            average_score: per_graded(self.earned_sum, self.graded_students),
            average_percentage: percentage(self.earned_sum, self.possible_sum),
            pass_rate: if self.total_students == 0 {
                0.0
            } else {
                self.passing_students as f64 / self.total_students as f64
            },
            tasks: self
                .tasks
                .iter()
                .map(|t| TaskSummary {
                    number: t.number,
                    name: t.name.clone(),
                    average_score: per_graded(t.earned_sum, t.graded),
                    average_percentage: percentage(t.earned_sum, t.possible_sum),
                })
                .collect(),
            defects: self.defects.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub number: usize,
    pub name: String,
    pub average_score: f64,
    pub average_percentage: f64,
}

/// Run-wide statistics. `pass_rate` is a fraction of all students, skipped included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_students: usize,
    pub graded_students: usize,
    pub skipped_students: usize,
    pub passing_students: usize,
    pub pass_threshold: f64,
    pub average_score: f64,
    pub average_percentage: f64,
    pub pass_rate: f64,
    pub tasks: Vec<TaskSummary>,
    pub defects: Vec<PatternCompileError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::answer_key_parser::compile_scheme;
    use crate::types::{GradingStatus, Student};
    use chrono::Utc;

    fn line(awarded: f64, possible: f64) -> LineResult {
        LineResult {
            position: 1,
            label: "x".to_string(),
            matched: awarded > 0.0,
            awarded,
            possible,
            message: String::new(),
        }
    }

    fn task(number: usize, earned: f64, possible: f64) -> TaskResult {
        TaskResult {
            number,
            name: format!("Task {number}"),
            lines: vec![],
            earned,
            possible,
        }
    }

    fn feedback(username: &str, status: GradingStatus, tasks: Vec<TaskResult>) -> StudentFeedback {
        let (earned, possible) = lab_totals(&tasks);
        StudentFeedback {
            student: Student::new(username, Some("1")),
            status,
            percentage: percentage(earned, possible),
            tasks,
            earned,
            possible,
            graded_at: Utc::now(),
            annotations: vec![],
        }
    }

    fn scheme() -> GradingScheme {
        compile_scheme("(3 Points) A\n(1) a\n(2) b\n(2 Points) B\n(2) c").unwrap()
    }

    /// Tests the basic functionality with a standard set of lines.
    #[test]
    fn test_task_totals_basic() {
        let lines = vec![line(1.0, 1.0), line(0.0, 2.0), line(0.5, 0.5)];
        assert_eq!(task_totals(&lines), (1.5, 3.5));
    }

    #[test]
    fn test_task_totals_empty() {
        assert_eq!(task_totals(&[]), (0.0, 0.0));
    }

    #[test]
    fn test_percentage_with_zero_possible() {
        assert_eq!(percentage(3.0, 0.0), 0.0);
        assert_eq!(percentage(3.0, 4.0), 75.0);
    }

    #[test]
    fn test_fold_counts_and_averages() {
        let mut agg = RunAggregate::new(&scheme(), DEFAULT_PASS_THRESHOLD);
        agg.fold(&feedback("a", GradingStatus::Graded, vec![task(1, 3.0, 3.0), task(2, 2.0, 2.0)]));
        agg.fold(&feedback("b", GradingStatus::Graded, vec![task(1, 1.0, 3.0), task(2, 0.0, 2.0)]));
        let summary = agg.finalize();

        assert_eq!(summary.total_students, 2);
        assert_eq!(summary.graded_students, 2);
        assert_eq!(summary.passing_students, 1);
        assert_eq!(summary.average_score, 3.0);
        assert_eq!(summary.average_percentage, 60.0);
        assert_eq!(summary.pass_rate, 0.5);
        assert_eq!(summary.tasks[0].average_score, 2.0);
        assert_eq!(summary.tasks[1].average_percentage, 50.0);
    }

    /// Skipped students count towards the total but not towards any average.
    #[test]
    fn test_skipped_students_excluded_from_sums() {
        let mut agg = RunAggregate::new(&scheme(), DEFAULT_PASS_THRESHOLD);
        agg.fold(&feedback("a", GradingStatus::Graded, vec![task(1, 3.0, 3.0), task(2, 2.0, 2.0)]));
        agg.fold(&feedback("b", GradingStatus::Skipped, vec![task(1, 0.0, 3.0), task(2, 0.0, 2.0)]));
        let summary = agg.finalize();

        assert_eq!(summary.total_students, 2);
        assert_eq!(summary.skipped_students, 1);
        assert_eq!(summary.average_score, 5.0);
        assert_eq!(summary.average_percentage, 100.0);
        assert_eq!(summary.pass_rate, 0.5);
    }

    #[test]
    fn test_exact_threshold_passes() {
        let mut agg = RunAggregate::new(&scheme(), 60.0);
        agg.fold(&feedback("a", GradingStatus::Graded, vec![task(1, 3.0, 3.0), task(2, 0.0, 2.0)]));
        assert_eq!(agg.finalize().passing_students, 1);
    }

    #[test]
    fn test_empty_run_has_zero_statistics() {
        let summary = RunAggregate::new(&scheme(), DEFAULT_PASS_THRESHOLD).finalize();
        assert_eq!(summary.total_students, 0);
        assert_eq!(summary.average_score, 0.0);
        assert_eq!(summary.pass_rate, 0.0);
        assert_eq!(summary.tasks.len(), 2);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let s = scheme();
        let fa = feedback("a", GradingStatus::Graded, vec![task(1, 3.0, 3.0), task(2, 1.0, 2.0)]);
        let fb = feedback("b", GradingStatus::Skipped, vec![]);
        let fc = feedback("c", GradingStatus::Graded, vec![task(1, 0.0, 3.0), task(2, 2.0, 2.0)]);

        let mut left = RunAggregate::new(&s, DEFAULT_PASS_THRESHOLD);
        left.fold(&fa);
        let mut right = RunAggregate::new(&s, DEFAULT_PASS_THRESHOLD);
        right.fold(&fb);
        right.fold(&fc);

        let mut sequential = RunAggregate::new(&s, DEFAULT_PASS_THRESHOLD);
        for f in [&fc, &fa, &fb] {
            sequential.fold(f);
        }

        let merged_lr = left.clone().merge(right.clone()).finalize();
        let merged_rl = right.merge(left).finalize();
        assert_eq!(merged_lr, merged_rl);
        assert_eq!(merged_lr, sequential.finalize());
    }
}
