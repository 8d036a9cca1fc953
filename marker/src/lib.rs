//! # Marker Library
//!
//! This module provides the core logic for grading network-device configuration
//! submissions against a lecturer's answer key.
//!
//! ## Key Concepts
//! - **GradingScheme**: The compiled answer key, produced once per lab by
//!   [`parsers::answer_key_parser`] and shared read-only across students.
//! - **Placeholders**: `{UID}`-style variables in the key, bound per student by
//!   [`binder`] and instantiated into regular expressions by [`instantiator`].
//! - **Comparators**: Pluggable strategies deciding whether a line's patterns are
//!   satisfied by a submission. The default is [`SearchComparator`].
//! - **MarkingJob**: One student's marking pass. [`run::grade_students`] builds one per student.
//! - **Run**: A whole roster graded concurrently by [`run::grade_students`], folded
//!   into run statistics by [`scorer`].
//! - **Reports**: Serializable feedback records built by [`report`].

pub mod binder;
pub mod comparators;
pub mod error;
pub mod evaluator;
pub mod instantiator;
pub mod parsers;
pub mod report;
pub mod run;
pub mod scheme;
pub mod scorer;
pub mod template;
pub mod traits;
pub mod types;

use crate::comparators::search_comparator::SearchComparator;
use crate::evaluator::{Submission, evaluate};
use crate::run::load_submission;
use crate::scheme::GradingScheme;
use crate::traits::comparator::SubmissionComparator;
use crate::traits::source::SubmissionSource;
use crate::types::{Student, StudentFeedback};

pub use crate::parsers::answer_key_parser::compile_scheme;

/// Represents a marking job for a single student submission.
///
/// # Fields
/// - `scheme`: The compiled grading scheme.
/// - `student`: The student being graded.
/// - `submission`: The text of each submission file the scheme references.
/// - `comparator`: Strategy for deciding whether a line is satisfied.
pub struct MarkingJob<'a> {
    scheme: &'a GradingScheme,
    student: &'a Student,
    submission: Submission,
    comparator: Box<dyn SubmissionComparator + 'a>,
}

impl<'a> MarkingJob<'a> {
    pub fn new(scheme: &'a GradingScheme, student: &'a Student, submission: Submission) -> Self {
        Self {
            scheme,
            student,
            submission,
            comparator: Box::new(SearchComparator),
        }
    }

    /// Create a job whose submission files are read from `source`.
    pub fn from_source(
        scheme: &'a GradingScheme,
        student: &'a Student,
        source: &dyn SubmissionSource,
    ) -> Self {
        Self::new(scheme, student, load_submission(scheme, student, source))
    }

    /// Set a custom comparator strategy for this marking job.
    pub fn with_comparator<C: SubmissionComparator + 'a>(mut self, comparator: C) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    /// Run the marking pass.
    ///
    /// Never fails: student-level problems are reported as annotations on the
    /// returned feedback.
    pub fn mark(self) -> StudentFeedback {
        evaluate(
            self.scheme,
            self.student,
            &self.submission,
            self.comparator.as_ref(),
        )
    }
}
