//! Placeholder templates.
//!
//! Answer-key text may reference per-student values with `{NAME}` tokens, where
//! `NAME` is an uppercase identifier (`{UID}`, `{USERNAME}`, `{IP}`). A [`Template`]
//! is the parsed form of such text: an ordered list of literal text segments and
//! placeholder names. Regex quantifiers such as `{2}` or `{1,3}` are never mistaken
//! for placeholders because a placeholder must start with a letter.

use crate::binder::VariableBinding;
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Z][A-Z0-9_]*)\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut cursor = 0;

        for caps in PLACEHOLDER.captures_iter(raw) {
            let whole = caps.get(0).expect("capture 0 always present");
            if whole.start() > cursor {
                segments.push(Segment::Text(raw[cursor..whole.start()].to_string()));
            }
            segments.push(Segment::Placeholder(caps[1].to_string()));
            cursor = whole.end();
        }
        if cursor < raw.len() {
            segments.push(Segment::Text(raw[cursor..].to_string()));
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in order of appearance (duplicates included).
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Plain-text rendering for messages. Unbound placeholders are kept verbatim.
    pub fn render(&self, binding: &VariableBinding) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Placeholder(name) => match binding.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

/// Substitutes placeholders in free text (details, feedback, titles).
pub fn render_text(raw: &str, binding: &VariableBinding) -> String {
    Template::parse(raw).render(binding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_segments() {
        let t = Template::parse("hostname R1-{UID}");
        assert_eq!(
            t.segments(),
            &[
                Segment::Text("hostname R1-".into()),
                Segment::Placeholder("UID".into())
            ]
        );
    }

    #[test]
    fn test_regex_quantifiers_are_not_placeholders() {
        let t = Template::parse(r"\d{1,3}\.\d{2} {uid}");
        assert_eq!(t.placeholders().count(), 0);
    }

    #[test]
    fn test_render_keeps_unbound_placeholders() {
        let binding = VariableBinding::from_pairs([("UID", "42")]);
        let t = Template::parse("{UID} via {IP}");
        assert_eq!(t.render(&binding), "42 via {IP}");
    }

    #[test]
    fn test_adjacent_placeholders() {
        let binding = VariableBinding::from_pairs([("A", "1"), ("B", "2")]);
        assert_eq!(render_text("{A}{B}", &binding), "12");
    }
}
