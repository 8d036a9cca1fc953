use crate::instantiator::ConcreteMatcher;
use std::sync::Arc;

/// SubmissionComparator is a strategy trait for matching a student's bound line
/// against the lines of their submission.
pub trait SubmissionComparator: Send + Sync {
    /// Returns true when the submission satisfies `matcher`.
    ///
    /// - `matcher`: the line's expression tree bound to this student.
    /// - `submission_lines`: the submission text split into lines.
    fn compare(&self, matcher: &ConcreteMatcher, submission_lines: &[&str]) -> bool;
}

impl<T: SubmissionComparator + ?Sized> SubmissionComparator for Arc<T> {
    fn compare(&self, matcher: &ConcreteMatcher, submission_lines: &[&str]) -> bool {
        (**self).compare(matcher, submission_lines)
    }
}
