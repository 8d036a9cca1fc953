//! A comparator that searches the whole submission for each pattern.
//!
//! The `SearchComparator` reflects how configuration dumps are written: blocks may
//! appear in any order and are surrounded by unrelated lines. A pattern is satisfied
//! if it is found anywhere on at least one submission line; nothing carries over
//! between gradable lines.

use crate::instantiator::{ConcreteMatcher, MatcherNode};
use crate::traits::comparator::SubmissionComparator;
use tracing::debug;

/// Awards a line when its pattern tree is satisfied by the submission.
///
/// - A pattern leaf matches if it is found on any submission line (search, not anchored).
/// - An AND-node needs every child satisfied, possibly by different lines.
/// - An OR-node needs at least one child satisfied.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchComparator;

impl SearchComparator {
    fn satisfied(node: &MatcherNode, submission_lines: &[&str]) -> bool {
        match node {
            MatcherNode::Pattern(re) => {
                let hit = submission_lines.iter().find(|line| re.is_match(line));
                match hit {
                    Some(line) => debug!(pattern = re.as_str(), line = *line, "match found"),
                    None => debug!(pattern = re.as_str(), "no match found"),
                }
                hit.is_some()
            }
            MatcherNode::All(children) => children
                .iter()
                .all(|c| Self::satisfied(c, submission_lines)),
            MatcherNode::Any(children) => children
                .iter()
                .any(|c| Self::satisfied(c, submission_lines)),
        }
    }
}

impl SubmissionComparator for SearchComparator {
    fn compare(&self, matcher: &ConcreteMatcher, submission_lines: &[&str]) -> bool {
        Self::satisfied(&matcher.root, submission_lines)
    }
}
