//! # Comparators
//!
//! Strategies for deciding whether a student's bound line is present in their
//! submission. All comparators implement the [`SubmissionComparator`] trait, so the
//! marking job can swap strategies without touching the evaluator.
//!
//! The available comparators are:
//! - [`search_comparator`]: a line is satisfied if its pattern is found on any
//!   submission line, in any order.
//!
//! [`SubmissionComparator`]: crate::traits::comparator::SubmissionComparator

pub mod search_comparator;
