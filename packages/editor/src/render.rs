//! # Annotation Renderer
//!
//! Turns the state of an evaluation pass into the fragment shown next to a
//! line. An expression line shows its own value; any other line shows the
//! bindings it mentions.

use interspy_evaluator::{EvalContext, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decides whether a binding is worth showing next to a line
pub trait RelevanceFilter: fmt::Debug + Send + Sync {
    fn is_relevant(&self, name: &str, line: &str) -> bool;
}

/// A binding is relevant when its name occurs anywhere in the line text
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringRelevance;

impl RelevanceFilter for SubstringRelevance {
    fn is_relevant(&self, name: &str, line: &str) -> bool {
        line.contains(name)
    }
}

/// A binding is relevant when the line contains its name as a whole
/// identifier, so `a` does not match `total`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentifierMatch;

impl RelevanceFilter for IdentifierMatch {
    fn is_relevant(&self, name: &str, line: &str) -> bool {
        identifiers(line).any(|ident| ident == name)
    }
}

fn identifiers(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| word.chars().next().is_some_and(|c| !c.is_ascii_digit()))
}

/// Relevance strategy by name, as written in configuration
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    #[default]
    Substring,
    Identifier,
}

impl Relevance {
    pub fn filter(self) -> Box<dyn RelevanceFilter> {
        match self {
            Relevance::Substring => Box::new(SubstringRelevance),
            Relevance::Identifier => Box::new(IdentifierMatch),
        }
    }
}

impl std::str::FromStr for Relevance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "substring" => Ok(Relevance::Substring),
            "identifier" => Ok(Relevance::Identifier),
            other => Err(format!(
                "unknown relevance '{}' (expected 'substring' or 'identifier')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    /// Value of an expression line
    Expression,
    /// Bindings mentioned by the line
    Bindings,
}

/// Rendered annotation content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    kind: FragmentKind,
    items: Vec<String>,
    markup: String,
}

impl Fragment {
    fn new(kind: FragmentKind, items: Vec<String>) -> Self {
        let open = match kind {
            FragmentKind::Expression => r#"<ul class="interspy">"#,
            FragmentKind::Bindings => {
                r#"<ul class="interspy" style="max-width: 300px; word-wrap: break-word">"#
            }
        };
        let mut markup = String::from(open);
        for item in &items {
            markup.push_str("<li><pre>");
            markup.push_str(&escape_html(item));
            markup.push_str("</pre></li>");
        }
        markup.push_str("</ul>");

        Self {
            kind,
            items,
            markup,
        }
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// Unescaped item text, for hosts that print plain text
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Escaped markup for hosts that render HTML
    pub fn markup(&self) -> &str {
        &self.markup
    }
}

#[derive(Debug)]
pub struct AnnotationRenderer {
    relevance: Box<dyn RelevanceFilter>,
}

impl Default for AnnotationRenderer {
    fn default() -> Self {
        Self::new(Box::new(SubstringRelevance))
    }
}

impl AnnotationRenderer {
    pub fn new(relevance: Box<dyn RelevanceFilter>) -> Self {
        Self { relevance }
    }

    /// Fragment for `line`, or `None` when there is nothing to show
    pub fn render(&self, context: &EvalContext, line: &str) -> Option<Fragment> {
        if let Some(value) = context.expression(line) {
            return Some(Fragment::new(
                FragmentKind::Expression,
                vec![describe(value)],
            ));
        }

        let items: Vec<String> = context
            .bindings()
            .iter()
            .filter(|(name, _)| self.relevance.is_relevant(name, line))
            .map(|(name, value)| format!("{}: {}", name, describe(value)))
            .collect();

        if items.is_empty() {
            None
        } else {
            Some(Fragment::new(FragmentKind::Bindings, items))
        }
    }
}

/// `value :: type`
fn describe(value: &Value) -> String {
    format!("{} :: {}", value, value.type_name())
}

/// Escape text for inclusion in HTML markup
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
