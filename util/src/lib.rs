//! File-facing side of the grader: run configuration, roster loading, submission
//! access and report writing. The grading logic itself lives in `marker`.

pub mod config;
pub mod paths;
pub mod roster;
pub mod submission_loader;
pub mod test_helpers;
pub mod writers;
