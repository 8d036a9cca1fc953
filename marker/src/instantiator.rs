//! # Pattern Instantiator
//!
//! Turns a [`GradableLine`] and a student's [`VariableBinding`] into a
//! [`ConcreteMatcher`]. This happens in two steps that can be tested on their own:
//!
//! 1. [`pattern_source`] substitutes placeholders and produces regex source text.
//!    Bound values are always escaped, so a UID such as `1.5*` can only ever match
//!    itself. Literal expressions are escaped as a whole, with whitespace runs
//!    relaxed to `\s+` so spacing differences in a configuration dump do not matter.
//! 2. [`compile_pattern`] compiles the source into a case-sensitive [`Regex`].
//!
//! Because substituted values are escaped, whether a line compiles never depends
//! on the student. [`probe_line`] uses that to find broken lines once, at scheme
//! compile time.

use crate::binder::VariableBinding;
use crate::error::PatternCompileError;
use crate::scheme::{Condition, Expression, ExpressionKind, GradableLine};
use crate::template::Segment;
use regex::Regex;

/// A compiled expression tree bound to one student.
#[derive(Debug, Clone)]
pub enum MatcherNode {
    Pattern(Regex),
    All(Vec<MatcherNode>),
    Any(Vec<MatcherNode>),
}

/// A gradable line bound to one student's values. Not retained beyond one evaluation.
#[derive(Debug, Clone)]
pub struct ConcreteMatcher {
    pub position: usize,
    pub root: MatcherNode,
}

/// Regex source for `expr` with every placeholder replaced by its escaped value.
/// Unbound placeholders are kept as escaped literal `{NAME}` text.
pub fn pattern_source(expr: &Expression, binding: &VariableBinding) -> String {
    let mut source = String::new();
    for segment in expr.template().segments() {
        match segment {
            Segment::Text(text) => match expr.kind {
                ExpressionKind::Regex => source.push_str(text),
                ExpressionKind::Literal => source.push_str(&escape_literal(text)),
            },
            Segment::Placeholder(name) => match binding.get(name) {
                Some(value) => source.push_str(&regex::escape(value)),
                None => source.push_str(&regex::escape(&format!("{{{name}}}"))),
            },
        }
    }
    source
}

/// Escapes literal text, turning each whitespace run into `\s+`.
fn escape_literal(text: &str) -> String {
    let mut out = String::new();
    let mut word = String::new();
    let mut in_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push_str(&regex::escape(&word));
                word.clear();
                out.push_str(r"\s+");
                in_space = true;
            }
        } else {
            word.push(ch);
            in_space = false;
        }
    }
    out.push_str(&regex::escape(&word));
    out
}

pub fn compile_pattern(source: &str) -> Result<Regex, regex::Error> {
    Regex::new(source)
}

fn build(
    condition: &Condition,
    binding: &VariableBinding,
    on_error: &dyn Fn(&Expression, regex::Error) -> PatternCompileError,
) -> Result<MatcherNode, PatternCompileError> {
    match condition {
        Condition::Match(expr) => compile_pattern(&pattern_source(expr, binding))
            .map(MatcherNode::Pattern)
            .map_err(|e| on_error(expr, e)),
        Condition::All(children) => children
            .iter()
            .map(|c| build(c, binding, on_error))
            .collect::<Result<Vec<_>, _>>()
            .map(MatcherNode::All),
        Condition::Any(children) => children
            .iter()
            .map(|c| build(c, binding, on_error))
            .collect::<Result<Vec<_>, _>>()
            .map(MatcherNode::Any),
    }
}

/// Binds `line` to a student and compiles it.
///
/// `task` is the owning task's number, used only to attribute errors.
pub fn instantiate(
    task: usize,
    line: &GradableLine,
    binding: &VariableBinding,
) -> Result<ConcreteMatcher, PatternCompileError> {
    let on_error = |expr: &Expression, err: regex::Error| PatternCompileError {
        task,
        position: line.position,
        expression: expr.raw.clone(),
        message: err.to_string(),
    };
    let root = build(&line.condition, binding, &on_error)?;
    Ok(ConcreteMatcher {
        position: line.position,
        root,
    })
}

/// Compiles `line` with placeholder probe values to check it independently of any student.
pub fn probe_line(task: usize, line: &GradableLine) -> Result<(), PatternCompileError> {
    let mut probe = VariableBinding::default();
    for expr in line.condition.expressions() {
        for name in expr.template().placeholders() {
            probe.insert(name, "0");
        }
    }
    instantiate(task, line, &probe).map(|_| ())
}
