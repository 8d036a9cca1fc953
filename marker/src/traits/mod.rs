//!
//! Traits Module
//!
//! This module contains the seams of the marker system.
//!
//! - [`comparator`]: Strategy for deciding whether a bound line is satisfied by a submission.
//! - [`parser`]: Generic trait for parsing raw input into strongly-typed structures.
//! - [`source`]: Where submission text comes from.

pub mod comparator;
pub mod parser;
pub mod source;
