//! Pattern compiler - Turns action match templates into regular expressions
//!
//! A template is a list of space separated tokens:
//! - plain tokens match literally (regex metacharacters are escaped)
//! - `:name` captures a single word or a double-quoted string
//! - `:?name` is an optional capture; optional captures may only trail
//!
//! The last token of a template, when it is a capture, takes the rest of
//! the message including spaces. Optional captures nest so they can be
//! dropped one by one from the right: `set :key to :?value` accepts both
//! `set volume to` and `set volume to 10`.

use std::fmt;

use regex_lite::{Regex, RegexBuilder};

use crate::application::errors::PatternError;

/// Capture used for every argument that is not the last token
const WORD_CAPTURE: &str = r#"(\S+|"[^"]*")"#;

/// Capture used when the argument is the last token of the template
const TAIL_CAPTURE: &str = "(.+)";

/// Compilation flags for templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternOptions {
    /// Wrap the expression with `^` and `$` so the whole body must match
    pub anchored: bool,
    pub case_sensitive: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            anchored: true,
            case_sensitive: false,
        }
    }
}

impl PatternOptions {
    pub fn unanchored(mut self) -> Self {
        self.anchored = false;
        self
    }

    /// Match case exactly. Without this, case folding covers ASCII letters
    /// only: `CAFÉ` and `café` differ in their last letter.
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }
}

/// What an action was asked to match: a template or a ready-made regex
#[derive(Debug, Clone)]
pub enum PatternSource {
    Template(String),
    Regex(Regex),
}

impl From<&str> for PatternSource {
    fn from(template: &str) -> Self {
        PatternSource::Template(template.to_string())
    }
}

impl From<String> for PatternSource {
    fn from(template: String) -> Self {
        PatternSource::Template(template)
    }
}

impl From<Regex> for PatternSource {
    fn from(regex: Regex) -> Self {
        PatternSource::Regex(regex)
    }
}

/// Whether a capture slot must be present in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotKind {
    Required,
    Optional,
}

/// A compiled matcher together with its capture layout and display form
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    slots: Vec<SlotKind>,
    display: String,
}

impl CompiledPattern {
    /// Compile a pattern source. Regex sources pass through untouched and
    /// ignore `options`.
    pub fn compile(source: &PatternSource, options: PatternOptions) -> Result<Self, PatternError> {
        match source {
            PatternSource::Regex(regex) => {
                let slots = vec![SlotKind::Required; regex.captures_len().saturating_sub(1)];
                Ok(Self {
                    display: format!("/{}/", regex.as_str()),
                    regex: regex.clone(),
                    slots,
                })
            }
            PatternSource::Template(template) => {
                let (mut expression, slots) = translate(template)?;
                if options.anchored {
                    expression = format!("^{}$", expression);
                }

                let regex = RegexBuilder::new(&expression)
                    .case_insensitive(!options.case_sensitive)
                    .build()
                    .map_err(|e| PatternError::InvalidRegex(e.to_string()))?;

                let flags = if options.case_sensitive { "" } else { "i" };
                Ok(Self {
                    display: format!("/{}/{}", expression, flags),
                    regex,
                    slots,
                })
            }
        }
    }

    /// Compile a template with default options
    pub fn template(template: &str) -> Result<Self, PatternError> {
        Self::compile(&PatternSource::from(template), PatternOptions::default())
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Capture layout. Raw regex sources carry no layout information, so
    /// each of their groups is listed as `Required` even when the group is
    /// optional and may capture nothing.
    pub fn slots(&self) -> &[SlotKind] {
        &self.slots
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    pub fn is_match(&self, body: &str) -> bool {
        self.regex.is_match(body)
    }

    /// Raw capture values, one per slot, `None` for slots that did not participate
    pub fn captures(&self, body: &str) -> Option<Vec<Option<String>>> {
        let caps = self.regex.captures(body)?;
        Some(
            (1..caps.len())
                .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
                .collect(),
        )
    }

    /// Capture values with surrounding double quotes removed
    pub fn arguments(&self, body: &str) -> Option<Vec<Option<String>>> {
        self.captures(body).map(|values| {
            values
                .into_iter()
                .map(|value| value.map(|v| unquote(&v).to_string()))
                .collect()
        })
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Strip one pair of double quotes wrapping the whole value
pub fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Translate a template into an unanchored expression and its slot layout
fn translate(template: &str) -> Result<(String, Vec<SlotKind>), PatternError> {
    let tokens: Vec<&str> = template.split(' ').collect();
    let last = tokens.len() - 1;

    let mut expression = String::with_capacity(template.len() * 2);
    let mut slots = Vec::new();
    let mut open_groups = 0usize;

    for (index, token) in tokens.iter().enumerate() {
        let Some(name) = token.strip_prefix(':') else {
            if index > 0 {
                expression.push(' ');
            }
            expression.push_str(&regex_lite::escape(token));
            continue;
        };

        let kind = if name.starts_with('?') {
            SlotKind::Optional
        } else {
            SlotKind::Required
        };

        match kind {
            SlotKind::Required if open_groups > 0 => {
                return Err(PatternError::RequiredAfterOptional(template.to_string()));
            }
            // The group swallows the separating space so the whole suffix can vanish
            SlotKind::Optional => {
                expression.push_str("(?:");
                open_groups += 1;
            }
            SlotKind::Required => {}
        }

        if index > 0 {
            expression.push(' ');
        }
        expression.push_str(if index == last { TAIL_CAPTURE } else { WORD_CAPTURE });
        slots.push(kind);
    }

    expression.push_str(&")?".repeat(open_groups));
    Ok((expression, slots))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pattern: &CompiledPattern, body: &str) -> Option<Vec<Option<String>>> {
        pattern.arguments(body)
    }

    fn some(values: &[&str]) -> Option<Vec<Option<String>>> {
        Some(values.iter().map(|v| Some(v.to_string())).collect())
    }

    #[test]
    fn test_literal_template() {
        let pattern = CompiledPattern::template("hello there").unwrap();
        assert!(pattern.is_match("hello there"));
        assert!(pattern.is_match("HELLO There"));
        assert!(!pattern.is_match("hello there friend"));
        assert!(pattern.slots().is_empty());
    }

    #[test]
    fn test_metacharacters_are_escaped() {
        let pattern = CompiledPattern::template("what's 1+1? (really)").unwrap();
        assert!(pattern.is_match("what's 1+1? (really)"));
        assert!(!pattern.is_match("what's 11? really"));
    }

    #[test]
    fn test_last_capture_is_greedy() {
        let pattern = CompiledPattern::template("remind me to :task").unwrap();
        assert_eq!(args(&pattern, "remind me to buy milk"), some(&["buy milk"]));
    }

    #[test]
    fn test_required_captures_in_order() {
        let pattern = CompiledPattern::template("move :from to :to now").unwrap();
        assert_eq!(args(&pattern, "move a1 to b2 now"), some(&["a1", "b2"]));
        assert_eq!(pattern.slots(), &[SlotKind::Required, SlotKind::Required]);
    }

    #[test]
    fn test_substituted_words_round_trip() {
        let pattern = CompiledPattern::template("give :who the :what please :note").unwrap();
        let words = ["alice", "x-42", "\"odd", "done."];
        let body = format!("give {} the {} please {}", words[0], words[1], words[3]);
        assert_eq!(args(&pattern, &body), some(&[words[0], words[1], words[3]]));

        let pattern = CompiledPattern::template("swap :a :b").unwrap();
        let body = format!("swap {} {}", words[2], words[1]);
        assert_eq!(pattern.captures(&body), some(&[words[2], words[1]]));
    }

    #[test]
    fn test_optional_tail_capture() {
        let pattern = CompiledPattern::template("set :key to :?value").unwrap();
        assert_eq!(args(&pattern, "set volume to"), Some(vec![Some("volume".to_string()), None]));
        assert_eq!(args(&pattern, "set volume to 10"), some(&["volume", "10"]));
        assert_eq!(pattern.slots(), &[SlotKind::Required, SlotKind::Optional]);
    }

    #[test]
    fn test_multiple_optional_captures_drop_from_right() {
        let pattern = CompiledPattern::template("roll :dice :?sides :?times").unwrap();
        assert_eq!(args(&pattern, "roll 2"), Some(vec![Some("2".to_string()), None, None]));
        assert_eq!(
            args(&pattern, "roll 2 6"),
            Some(vec![Some("2".to_string()), Some("6".to_string()), None])
        );
        assert_eq!(args(&pattern, "roll 2 6 three times"), some(&["2", "6", "three times"]));
    }

    #[test]
    fn test_required_after_optional_is_rejected() {
        let err = CompiledPattern::template("pick :?first :second").unwrap_err();
        assert!(matches!(err, PatternError::RequiredAfterOptional(_)));
    }

    #[test]
    fn test_quoted_capture_is_unquoted() {
        let pattern = CompiledPattern::template("tag :label").unwrap();
        assert_eq!(args(&pattern, "tag \"hello world\""), some(&["hello world"]));

        let pattern = CompiledPattern::template("tag :label with :colour").unwrap();
        assert_eq!(
            args(&pattern, "tag \"hello world\" with red"),
            some(&["hello world", "red"])
        );
        assert_eq!(
            pattern.captures("tag \"hello world\" with red"),
            some(&["\"hello world\"", "red"])
        );
    }

    #[test]
    fn test_case_sensitive_option() {
        let source = PatternSource::from("Hello");
        let pattern = CompiledPattern::compile(&source, PatternOptions::default().case_sensitive()).unwrap();
        assert!(pattern.is_match("Hello"));
        assert!(!pattern.is_match("hello"));
        assert_eq!(pattern.as_str(), "/^Hello$/");
    }

    #[test]
    fn test_unanchored_option() {
        let source = PatternSource::from("coffee");
        let pattern = CompiledPattern::compile(&source, PatternOptions::default().unanchored()).unwrap();
        assert!(pattern.is_match("I would love a coffee right now"));
        assert_eq!(pattern.as_str(), "/coffee/i");
    }

    #[test]
    fn test_regex_passes_through() {
        let regex = Regex::new(r"^(\d+) \+ (\d+)$").unwrap();
        let pattern = CompiledPattern::compile(&regex.into(), PatternOptions::default()).unwrap();
        assert_eq!(pattern.captures("2 + 3"), some(&["2", "3"]));
        assert_eq!(pattern.slots().len(), 2);
        assert_eq!(pattern.to_string(), r"/^(\d+) \+ (\d+)$/");
    }

    #[test]
    fn test_regex_optional_group_reports_missing_capture() {
        let regex = Regex::new(r"^ping(?: (\w+))?$").unwrap();
        let pattern = CompiledPattern::compile(&regex.into(), PatternOptions::default()).unwrap();
        assert_eq!(pattern.slots(), &[SlotKind::Required]);
        assert_eq!(pattern.captures("ping"), Some(vec![None]));
    }

    #[test]
    fn test_case_folding_is_ascii_only() {
        let pattern = CompiledPattern::template("café").unwrap();
        assert!(pattern.is_match("CAFé"));
        assert!(!pattern.is_match("CAFÉ"));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("\"\""), "");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("\"half"), "\"half");
        assert_eq!(unquote("plain"), "plain");
    }
}
