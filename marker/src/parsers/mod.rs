//! # Parsers
//!
//! This module turns raw instructor input into the structures the marker works with.
//! Parsers implement the [`Parser`](crate::traits::parser::Parser) trait so callers get
//! a consistent interface and a [`MarkerError`](crate::error::MarkerError) on failure.
//!
//! The available parsers are:
//! - [`answer_key_parser`]: compiles an answer key into a grading scheme.

pub mod answer_key_parser;
