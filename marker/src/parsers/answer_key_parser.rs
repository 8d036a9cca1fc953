//!
//! Answer Key Parser
//!
//! This module compiles an instructor's answer key into a [`GradingScheme`].
//!
//! # Format
//!
//! The key is line oriented; surrounding whitespace is ignored.
//!
//! ```text
//! #[COURSE: CST8371]
//! #[LAB: Lab 3]
//! #[PROFESSOR: A. Instructor]
//! #[TOTAL: 4]
//! !-- comment
//! #[FILE: R1.txt]
//! (3 Points) Router basics
//!     (1) hostname R1-{UID}
//!     #[DETAIL: R1 - hostname set to {UID}]
//!     #[FEEDBACK: R1 - hostname is not R1-{UID}]
//!     (2) interface g0/0 &&
//!         ip address 10.{UID}.0.1 255.255.255.0 &&
//!         no shutdown
//! #[TASK: Banner]
//!     #[1] /^banner motd .*{USERNAME}/
//! ```
//!
//! - `(<n> Points) <title>` and `#[TASK: <title>]` open a task; the first form declares
//!   the task total, which must equal the sum of its lines.
//! - `(<n>) <expr>` and `#[<n>] <expr>` declare a gradable line worth `n` points.
//! - An expression ending in `&&` or `||` continues on the following lines (operands).
//! - `/.../` expressions are regular expressions; everything else is literal text.
//! - `!--` and `# ` lines are comments.
//! - Unrecognised `#[...]` directives are skipped with a warning. Text after a keyword
//!   directive's closing bracket is ignored.
//!
//! # Error Handling
//!
//! Structural problems produce a [`SchemeFormatError`] naming the offending line.
//! Patterns that fail to compile do not fail the parse; they are recorded as
//! defects on the scheme and logged once.

use crate::error::{MarkerError, SchemeFormatError};
use crate::instantiator::probe_line;
use crate::scheme::{Condition, Expression, GradableLine, GradingScheme, SchemeMetadata, Task};
use crate::traits::parser::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

const COMMENT_IDENTIFIER: &str = "!--";
const POINTS_EPSILON: f64 = 1e-9;

static TASK_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\(\s*([^)]*?)\s*points?\s*\)\s*(.*)$").expect("task header pattern is valid")
});
static GRADABLE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\s*([^)]*?)\s*\)\s*(.*)$").expect("line pattern is valid"));
static KEYWORD_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#\[\s*([A-Za-z_]+)\s*:\s*(.*?)\s*\]\s*$").expect("keyword pattern is valid")
});
// Text after the first closing bracket is ignored.
static KEYWORD_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#\[\s*([A-Za-z_]+)\s*:\s*([^\]]*?)\s*\]").expect("keyword pattern is valid")
});
static POINTS_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\[\s*([-+\d.]+)\s*\](.*)$").expect("points pattern is valid"));
static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("number pattern is valid"));

/// Compiles answer-key text into a [`GradingScheme`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AnswerKeyParser;

impl<'a> Parser<&'a str, GradingScheme> for AnswerKeyParser {
    fn parse(&self, input: &'a str) -> Result<GradingScheme, MarkerError> {
        Ok(compile_scheme(input)?)
    }
}

/// One classified answer-key line.
#[derive(Debug, PartialEq)]
enum Directive<'a> {
    Skip,
    Course(&'a str),
    Lab(&'a str),
    Professor(&'a str),
    Total(&'a str),
    File(&'a str),
    Task { title: &'a str, declared: Option<f64> },
    Line { points: f64, expression: &'a str },
    Detail(&'a str),
    Feedback(&'a str),
    Unknown(&'a str),
    Bare(&'a str),
}

fn parse_points(line_no: usize, raw: &str) -> Result<f64, SchemeFormatError> {
    if !NUMBER.is_match(raw) {
        return Err(SchemeFormatError::new(
            line_no,
            format!("point value '{raw}' is not numeric"),
        ));
    }
    raw.parse::<f64>().map_err(|_| {
        SchemeFormatError::new(line_no, format!("point value '{raw}' is not numeric"))
    })
}

fn classify(line_no: usize, text: &str) -> Result<Directive<'_>, SchemeFormatError> {
    if text.is_empty() || text.starts_with(COMMENT_IDENTIFIER) {
        return Ok(Directive::Skip);
    }
    if text.starts_with('#') && !text.starts_with("#[") {
        return Ok(Directive::Skip);
    }

    let keyword_caps = KEYWORD_DIRECTIVE
        .captures(text)
        .or_else(|| KEYWORD_PREFIX.captures(text));
    if let Some(caps) = keyword_caps {
        let keyword = caps.get(1).map_or("", |m| m.as_str());
        let value = caps.get(2).map_or("", |m| m.as_str());
        return Ok(match keyword.to_ascii_uppercase().as_str() {
            "COURSE" => Directive::Course(value),
            "LAB" => Directive::Lab(value),
            "PROFESSOR" => Directive::Professor(value),
            "TOTAL" => Directive::Total(value),
            "FILE" => Directive::File(value),
            "TASK" => Directive::Task {
                title: value,
                declared: None,
            },
            "DETAIL" => Directive::Detail(value),
            "FEEDBACK" => Directive::Feedback(value),
            _ => Directive::Unknown(keyword),
        });
    }

    if let Some(caps) = POINTS_DIRECTIVE.captures(text) {
        let points = parse_points(line_no, caps.get(1).map_or("", |m| m.as_str()))?;
        return Ok(Directive::Line {
            points,
            expression: caps.get(2).map_or("", |m| m.as_str().trim()),
        });
    }

    if text.starts_with("#[") {
        return Ok(Directive::Unknown(text));
    }

    if let Some(caps) = TASK_HEADER.captures(text) {
        let declared = parse_points(line_no, caps.get(1).map_or("", |m| m.as_str()))?;
        return Ok(Directive::Task {
            title: caps.get(2).map_or("", |m| m.as_str().trim()),
            declared: Some(declared),
        });
    }

    if let Some(caps) = GRADABLE_LINE.captures(text) {
        let points = parse_points(line_no, caps.get(1).map_or("", |m| m.as_str()))?;
        return Ok(Directive::Line {
            points,
            expression: caps.get(2).map_or("", |m| m.as_str().trim()),
        });
    }

    Ok(Directive::Bare(text))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
}

impl Operator {
    fn token(self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }
}

/// Splits a trailing `&&`/`||` off an expression.
fn split_operator(expression: &str) -> (&str, Option<Operator>) {
    let trimmed = expression.trim_end();
    if let Some(rest) = trimmed.strip_suffix("&&") {
        (rest.trim_end(), Some(Operator::And))
    } else if let Some(rest) = trimmed.strip_suffix("||") {
        (rest.trim_end(), Some(Operator::Or))
    } else {
        (trimmed, None)
    }
}

struct PendingComposite {
    op: Operator,
    operands: Vec<Expression>,
    points: f64,
    source_line: usize,
}

struct OpenTask {
    task: Task,
    header_line: usize,
}

#[derive(Default)]
struct SchemeBuilder {
    metadata: SchemeMetadata,
    tasks: Vec<Task>,
    current: Option<OpenTask>,
    file: Option<String>,
    pending: Option<PendingComposite>,
}

impl SchemeBuilder {
    fn feed(&mut self, line_no: usize, text: &str) -> Result<(), SchemeFormatError> {
        let directive = classify(line_no, text)?;

        if self.pending.is_some() {
            return match directive {
                Directive::Skip => Ok(()),
                Directive::Bare(operand) => self.continue_composite(line_no, operand),
                _ => Err(SchemeFormatError::new(
                    line_no,
                    "composite line expects another operand",
                )),
            };
        }

        debug!(line = line_no, ?directive, "answer key directive");
        match directive {
            Directive::Skip => {}
            Directive::Course(v) => self.metadata.course = Some(v.to_string()),
            Directive::Lab(v) => self.metadata.lab = Some(v.to_string()),
            Directive::Professor(v) => self.metadata.professor = Some(v.to_string()),
            Directive::Total(v) => self.metadata.declared_total = Some(parse_points(line_no, v)?),
            Directive::File(name) => {
                if name.is_empty() {
                    return Err(SchemeFormatError::new(line_no, "FILE directive has no file name"));
                }
                self.close_task()?;
                self.file = Some(name.to_string());
            }
            Directive::Task { title, declared } => {
                if title.is_empty() {
                    return Err(SchemeFormatError::new(line_no, "task header has no title"));
                }
                self.close_task()?;
                self.current = Some(OpenTask {
                    task: Task {
                        number: self.tasks.len() + 1,
                        title: title.to_string(),
                        declared_points: declared,
                        file: self.file.clone(),
                        lines: Vec::new(),
                    },
                    header_line: line_no,
                });
            }
            Directive::Line { points, expression } => {
                if self.current.is_none() {
                    return Err(SchemeFormatError::new(
                        line_no,
                        "gradable line appears before any task header",
                    ));
                }
                let (body, op) = split_operator(expression);
                if body.is_empty() {
                    return Err(SchemeFormatError::new(line_no, "gradable line has no expression"));
                }
                match op {
                    None => self.push_line(points, Condition::Match(Expression::parse(body)), line_no),
                    Some(op) => {
                        self.pending = Some(PendingComposite {
                            op,
                            operands: vec![Expression::parse(body)],
                            points,
                            source_line: line_no,
                        })
                    }
                }
            }
            Directive::Detail(text) => self.last_line(line_no, "DETAIL")?.detail = Some(text.to_string()),
            Directive::Feedback(text) => {
                self.last_line(line_no, "FEEDBACK")?.feedback = Some(text.to_string())
            }
            Directive::Unknown(directive) => {
                warn!(line = line_no, directive, "unknown answer key directive, skipping");
            }
            Directive::Bare(text) => {
                warn!(line = line_no, text, "unrecognised answer key line, skipping");
            }
        }
        Ok(())
    }

    fn continue_composite(&mut self, line_no: usize, operand: &str) -> Result<(), SchemeFormatError> {
        let (body, op) = split_operator(operand);
        if body.is_empty() {
            return Err(SchemeFormatError::new(line_no, "composite operand is empty"));
        }
        let Some(mut pending) = self.pending.take() else {
            return Ok(());
        };
        pending.operands.push(Expression::parse(body));

        match op {
            Some(next) if next != pending.op => Err(SchemeFormatError::new(
                line_no,
                format!(
                    "composite line mixes '{}' and '{}'",
                    pending.op.token(),
                    next.token()
                ),
            )),
            Some(_) => {
                self.pending = Some(pending);
                Ok(())
            }
            None => {
                let leaves = pending.operands.into_iter().map(Condition::Match).collect();
                let condition = match pending.op {
                    Operator::And => Condition::All(leaves),
                    Operator::Or => Condition::Any(leaves),
                };
                self.push_line(pending.points, condition, pending.source_line);
                Ok(())
            }
        }
    }

    fn push_line(&mut self, points: f64, condition: Condition, source_line: usize) {
        if let Some(open) = self.current.as_mut() {
            open.task.lines.push(GradableLine {
                position: open.task.lines.len() + 1,
                points,
                condition,
                detail: None,
                feedback: None,
                source_line,
                defect: None,
            });
        }
    }

    fn last_line(
        &mut self,
        line_no: usize,
        keyword: &str,
    ) -> Result<&mut GradableLine, SchemeFormatError> {
        self.current
            .as_mut()
            .and_then(|open| open.task.lines.last_mut())
            .ok_or_else(|| {
                SchemeFormatError::new(line_no, format!("{keyword} has no preceding gradable line"))
            })
    }

    fn close_task(&mut self) -> Result<(), SchemeFormatError> {
        let Some(open) = self.current.take() else {
            return Ok(());
        };
        let task = open.task;
        if task.lines.is_empty() {
            return Err(SchemeFormatError::new(
                open.header_line,
                format!("task '{}' has no gradable lines", task.title),
            ));
        }
        if let Some(declared) = task.declared_points {
            let sum = task.points();
            if (declared - sum).abs() > POINTS_EPSILON {
                return Err(SchemeFormatError::new(
                    open.header_line,
                    format!(
                        "task '{}' declares {declared} points but its lines total {sum}",
                        task.title
                    ),
                ));
            }
        }
        self.tasks.push(task);
        Ok(())
    }

    fn finish(mut self, last_line: usize) -> Result<GradingScheme, SchemeFormatError> {
        if self.pending.is_some() {
            return Err(SchemeFormatError::new(
                last_line,
                "answer key ends inside a composite line",
            ));
        }
        self.close_task()?;
        if self.tasks.is_empty() {
            return Err(SchemeFormatError::new(0, "answer key defines no tasks"));
        }

        let mut scheme = GradingScheme {
            metadata: self.metadata,
            tasks: self.tasks,
            defects: Vec::new(),
        };

        if let Some(declared) = scheme.metadata.declared_total {
            let sum = scheme.total_points();
            if (declared - sum).abs() > POINTS_EPSILON {
                return Err(SchemeFormatError::new(
                    0,
                    format!("TOTAL declares {declared} points but the tasks total {sum}"),
                ));
            }
        }

        for task in scheme.tasks.iter_mut() {
            for line in task.lines.iter_mut() {
                if let Err(defect) = probe_line(task.number, line) {
                    warn!(
                        task = task.number,
                        line = line.position,
                        source_line = line.source_line,
                        error = %defect,
                        "pattern cannot compile, line will score 0 for every student"
                    );
                    line.defect = Some(defect.message.clone());
                    scheme.defects.push(defect);
                }
            }
        }

        Ok(scheme)
    }
}

/// Compiles answer-key text into a grading scheme.
///
/// Compilation is deterministic: the same text always yields the same scheme.
pub fn compile_scheme(text: &str) -> Result<GradingScheme, SchemeFormatError> {
    let mut builder = SchemeBuilder::default();
    let mut last_line = 0;
    for (index, raw) in text.lines().enumerate() {
        last_line = index + 1;
        builder.feed(last_line, raw.trim())?;
    }
    builder.finish(last_line)
}
