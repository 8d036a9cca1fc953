//! # Grading Scheme
//!
//! The compiled, immutable form of an answer key. A [`GradingScheme`] is built once
//! per lab by the answer-key parser and shared read-only by every student's
//! marking pass.
//!
//! Each [`GradableLine`] holds a [`Condition`]: a single match [`Expression`], or an
//! AND/OR node over nested conditions. Expressions remember how they were authored
//! (literal text or `/regex/`) together with their parsed [`Template`].

use crate::binder::VariableBinding;
use crate::error::PatternCompileError;
use crate::template::{Template, render_text};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemeMetadata {
    pub course: Option<String>,
    pub lab: Option<String>,
    pub professor: Option<String>,
    /// Lab total declared with `#[TOTAL: n]`, if any.
    pub declared_total: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionKind {
    Literal,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub raw: String,
    pub kind: ExpressionKind,
    #[serde(skip)]
    template: Template,
}

impl Expression {
    /// `/.../` is a regular expression, everything else is literal text.
    pub fn parse(text: &str) -> Self {
        let raw = text.trim().to_string();
        let (kind, body) = if raw.len() >= 2 && raw.starts_with('/') && raw.ends_with('/') {
            (ExpressionKind::Regex, &raw[1..raw.len() - 1])
        } else {
            (ExpressionKind::Literal, raw.as_str())
        };
        let template = Template::parse(body);
        Self {
            raw,
            kind,
            template,
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn render(&self, binding: &VariableBinding) -> String {
        self.template.render(binding)
    }
}

/// Tagged expression tree for a gradable line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Match(Expression),
    /// Every child must match.
    All(Vec<Condition>),
    /// At least one child must match.
    Any(Vec<Condition>),
}

impl Condition {
    /// Depth-first list of the leaf expressions.
    pub fn expressions(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Expression>) {
        match self {
            Condition::Match(expr) => out.push(expr),
            Condition::All(children) | Condition::Any(children) => {
                for child in children {
                    child.collect(out);
                }
            }
        }
    }

    pub fn render(&self, binding: &VariableBinding) -> String {
        match self {
            Condition::Match(expr) => expr.render(binding),
            Condition::All(children) => join(children, " && ", binding),
            Condition::Any(children) => join(children, " || ", binding),
        }
    }
}

fn join(children: &[Condition], op: &str, binding: &VariableBinding) -> String {
    children
        .iter()
        .map(|c| c.render(binding))
        .collect::<Vec<_>>()
        .join(op)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradableLine {
    /// 1-based position within the task.
    pub position: usize,
    pub points: f64,
    pub condition: Condition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub source_line: usize,
    /// Set when the line's pattern cannot compile; the line then never matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defect: Option<String>,
}

impl GradableLine {
    pub fn label(&self, binding: &VariableBinding) -> String {
        match &self.detail {
            Some(detail) => render_text(detail, binding),
            None => self.condition.render(binding),
        }
    }

    pub fn failure_message(&self, binding: &VariableBinding) -> String {
        match &self.feedback {
            Some(feedback) => render_text(feedback, binding),
            None => self.label(binding),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub number: usize,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_points: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub lines: Vec<GradableLine>,
}

impl Task {
    pub fn points(&self) -> f64 {
        self.lines.iter().map(|l| l.points).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingScheme {
    pub metadata: SchemeMetadata,
    pub tasks: Vec<Task>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defects: Vec<PatternCompileError>,
}

impl GradingScheme {
    pub fn total_points(&self) -> f64 {
        self.tasks.iter().map(Task::points).sum()
    }

    /// Every placeholder name used anywhere in the scheme.
    pub fn placeholders(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for task in &self.tasks {
            names.extend(Template::parse(&task.title).placeholders().map(str::to_string));
            for line in &task.lines {
                for expr in line.condition.expressions() {
                    names.extend(expr.template().placeholders().map(str::to_string));
                }
                for text in line.detail.iter().chain(line.feedback.iter()) {
                    names.extend(Template::parse(text).placeholders().map(str::to_string));
                }
            }
        }
        names
    }

    /// Submission files referenced by the tasks, in first-use order. `None` is the
    /// default submission file for tasks declared before any `#[FILE: ...]`.
    pub fn files(&self) -> Vec<Option<String>> {
        let mut files: Vec<Option<String>> = Vec::new();
        for task in &self.tasks {
            if !files.contains(&task.file) {
                files.push(task.file.clone());
            }
        }
        files
    }

    pub fn line_count(&self) -> usize {
        self.tasks.iter().map(|t| t.lines.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: f64, condition: Condition) -> GradableLine {
        GradableLine {
            position: 1,
            points,
            condition,
            detail: None,
            feedback: None,
            source_line: 1,
            defect: None,
        }
    }

    #[test]
    fn test_expression_kind_detection() {
        assert_eq!(Expression::parse("/^interface .*/").kind, ExpressionKind::Regex);
        assert_eq!(Expression::parse("interface g0/0").kind, ExpressionKind::Literal);
        assert_eq!(Expression::parse("/").kind, ExpressionKind::Literal);
    }

    #[test]
    fn test_regex_template_excludes_slashes() {
        let expr = Expression::parse("/hostname R{UID}/");
        let binding = VariableBinding::from_pairs([("UID", "3")]);
        assert_eq!(expr.render(&binding), "hostname R3");
    }

    #[test]
    fn test_condition_render_and_expressions() {
        let cond = Condition::All(vec![
            Condition::Match(Expression::parse("a")),
            Condition::Any(vec![
                Condition::Match(Expression::parse("b")),
                Condition::Match(Expression::parse("c")),
            ]),
        ]);
        assert_eq!(cond.render(&VariableBinding::default()), "a && b || c");
        assert_eq!(cond.expressions().len(), 3);
    }

    #[test]
    fn test_label_prefers_detail() {
        let mut l = line(1.0, Condition::Match(Expression::parse("hostname R1-{UID}")));
        let binding = VariableBinding::from_pairs([("UID", "9")]);
        assert_eq!(l.label(&binding), "hostname R1-9");
        l.detail = Some("R1 - hostname set to {UID}".into());
        assert_eq!(l.label(&binding), "R1 - hostname set to 9");
        assert_eq!(l.failure_message(&binding), "R1 - hostname set to 9");
    }

    #[test]
    fn test_scheme_placeholders_and_files() {
        let mut l = line(2.0, Condition::Match(Expression::parse("ip address {IP}")));
        l.feedback = Some("set {USERNAME}'s address".into());
        let scheme = GradingScheme {
            metadata: SchemeMetadata::default(),
            tasks: vec![
                Task {
                    number: 1,
                    title: "Router {UID}".into(),
                    declared_points: None,
                    file: Some("r1.txt".into()),
                    lines: vec![l.clone()],
                },
                Task {
                    number: 2,
                    title: "Switch".into(),
                    declared_points: None,
                    file: Some("r1.txt".into()),
                    lines: vec![l],
                },
            ],
            defects: vec![],
        };
        let names: Vec<_> = scheme.placeholders().into_iter().collect();
        assert_eq!(names, vec!["IP", "UID", "USERNAME"]);
        assert_eq!(scheme.files(), vec![Some("r1.txt".to_string())]);
        assert_eq!(scheme.total_points(), 4.0);
        assert_eq!(scheme.line_count(), 2);
    }
}
