//! fOS CSS Parser & Style System
//!
//! Stylesheet and inline-declaration parsing (cssparser for the rule
//! walk, lightningcss for selectors), selector specificity, and the
//! per-document style side table used by the query engine's cascade.

mod parser;
mod specificity;
mod cascade;

pub use parser::{parse_inline_declarations, CssParser};
pub use specificity::selector_specificity;
pub use cascade::{StyleRecord, StyleTable, StyleValue};

/// Parse a CSS stylesheet
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    CssParser::new().parse(css)
}

/// Parsed stylesheet
#[derive(Debug, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// CSS rule
#[derive(Debug)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// CSS selector
#[derive(Debug)]
pub struct Selector {
    pub text: String,
    pub specificity: Specificity,
}

/// Selector specificity (a, b, c)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Single comparable weight: ids 100, classes 10, types 1
    pub fn score(self) -> u32 {
        self.0 * 100 + self.1 * 10 + self.2
    }
}

/// CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }
}

/// CSS parsing error
#[derive(Debug, thiserror::Error)]
pub enum CssError {
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),
}
