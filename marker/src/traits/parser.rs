//! Turns answer-key text into a compiled grading scheme.
//!
//! ```rust
//! use marker::error::MarkerError;
//! use marker::traits::parser::Parser;
//!
//! struct LineCounter;
//!
//! impl<'a> Parser<&'a str, usize> for LineCounter {
//!     fn parse(&self, input: &'a str) -> Result<usize, MarkerError> {
//!         Ok(input.lines().count())
//!     }
//! }
//!
//! assert_eq!(LineCounter.parse("a\nb").unwrap(), 2);
//! ```

use crate::error::MarkerError;

/// Compiles some `Input` into a validated `Output`.
///
/// The answer-key compiler is the only implementor in this crate. Any structural defect in
/// the input is reported as a [`MarkerError`] carrying the offending line number, so the
/// caller can halt before any student is graded.
pub trait Parser<Input, Output> {
    fn parse(&self, input: Input) -> Result<Output, MarkerError>;
}
