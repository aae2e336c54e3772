//! CSS Parser using lightningcss
//!
//! cssparser walks the rule list and keeps every declaration value as
//! authored; lightningcss parses the selector preludes.

use cssparser::{
    parse_important, AtRuleParser, CowRcStr, DeclarationParser, Delimiter, ParseError, Parser,
    ParserInput, ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
    StyleSheetParser,
};
use lightningcss::selector::SelectorList;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions};
use lightningcss::traits::{ParseWithOptions, ToCss};

use crate::specificity::specificity_of;
use crate::{CssError, Declaration, Rule, Selector, Stylesheet};

/// CSS Parser
pub struct CssParser;

impl CssParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a CSS stylesheet
    ///
    /// Rules whose selectors do not parse, and at-rules such as `@media`,
    /// are skipped; bad declarations inside a rule are dropped.
    pub fn parse(&self, css: &str) -> Stylesheet {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut collector = RuleCollector;

        let mut result = Stylesheet::new();
        for rule in StyleSheetParser::new(&mut parser, &mut collector) {
            match rule {
                Ok(rule) => result.rules.push(rule),
                Err((_, skipped)) => tracing::debug!(rule = skipped.trim(), "skipped rule"),
            }
        }
        tracing::debug!(rules = result.len(), "parsed stylesheet");
        result
    }
}

impl Default for CssParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the contents of a `style` attribute
///
/// Fails on the first malformed declaration.
pub fn parse_inline_declarations(text: &str) -> Result<Vec<Declaration>, CssError> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut collector = DeclarationCollector;
    let body: RuleBodyParser<'_, '_, '_, _, Declaration, ()> = RuleBodyParser::new(&mut parser, &mut collector);
    body.map(|item| item.map_err(|(_, bad)| CssError::InvalidDeclaration(bad.trim().to_string())))
        .collect()
}

/// Style rules of a stylesheet
struct RuleCollector;

impl<'i> QualifiedRuleParser<'i> for RuleCollector {
    type Prelude = Vec<Selector>;
    type QualifiedRule = Rule;
    type Error = ();

    fn parse_prelude<'t>(&mut self, input: &mut Parser<'i, 't>) -> Result<Self::Prelude, ParseError<'i, ()>> {
        let start = input.position();
        while input.next().is_ok() {}
        let text = input.slice_from(start).trim();

        let list = SelectorList::parse_string_with_options(text, ParserOptions::default())
            .map_err(|_| input.new_custom_error(()))?;
        Ok(list
            .0
            .iter()
            .filter_map(|selector| {
                let text = selector.to_css_string(PrinterOptions::default()).ok()?;
                Some(Selector {
                    specificity: specificity_of(selector),
                    text,
                })
            })
            .collect())
    }

    fn parse_block<'t>(
        &mut self,
        selectors: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Rule, ParseError<'i, ()>> {
        let mut collector = DeclarationCollector;
        let body: RuleBodyParser<'_, '_, '_, _, Declaration, ()> = RuleBodyParser::new(input, &mut collector);
        let declarations = body
            .filter_map(|item| match item {
                Ok(declaration) => Some(declaration),
                Err((_, bad)) => {
                    tracing::debug!(declaration = bad.trim(), "dropped declaration");
                    None
                }
            })
            .collect();
        Ok(Rule {
            selectors,
            declarations,
        })
    }
}

// at-rules do not take part in the cascade
impl<'i> AtRuleParser<'i> for RuleCollector {
    type Prelude = ();
    type AtRule = Rule;
    type Error = ();
}

/// Declarations of a block, values kept as written
struct DeclarationCollector;

impl<'i> DeclarationParser<'i> for DeclarationCollector {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _declaration_start: &ParserState,
    ) -> Result<Declaration, ParseError<'i, ()>> {
        let start = input.position();
        input.parse_until_before(Delimiter::Bang, |value| {
            while value.next().is_ok() {}
            Ok::<_, ParseError<'i, ()>>(())
        })?;
        let value = input.slice_from(start).trim();
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }
        let important = input.try_parse(parse_important).is_ok();
        input.expect_exhausted()?;

        let property = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        Ok(Declaration {
            property,
            value: value.to_string(),
            important,
        })
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationCollector {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();
}

impl<'i> AtRuleParser<'i> for DeclarationCollector {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl<'i> RuleBodyItemParser<'i, Declaration, ()> for DeclarationCollector {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let css = r#"
            .foo { display: block; }
            #bar { color: red; }
        "#;

        let stylesheet = CssParser::new().parse(css);
        assert_eq!(stylesheet.len(), 2);
        assert_eq!(stylesheet.rules[1].selectors[0].text, "#bar");
        assert_eq!(stylesheet.rules[1].selectors[0].specificity.score(), 100);
        assert_eq!(stylesheet.rules[1].declarations[0], Declaration::new("color", "red"));
    }

    #[test]
    fn test_selector_list_is_split() {
        let stylesheet = CssParser::new().parse("p, div.x { width: 10px }");
        let texts: Vec<_> = stylesheet.rules[0].selectors.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["p", "div.x"]);
        assert_eq!(stylesheet.rules[0].declarations[0].value, "10px");
    }

    #[test]
    fn test_values_are_kept_as_written() {
        let stylesheet = CssParser::new().parse("p { color: blue; margin: 0px 0px; background: url(a.png) }");
        let values: Vec<_> = stylesheet.rules[0].declarations.iter().map(|d| d.value.as_str()).collect();
        assert_eq!(values, vec!["blue", "0px 0px", "url(a.png)"]);
    }

    #[test]
    fn test_inline_declarations() {
        let decls = parse_inline_declarations("color: blue; font-weight: bold").unwrap();
        assert_eq!(decls, vec![Declaration::new("color", "blue"), Declaration::new("font-weight", "bold")]);
    }

    #[test]
    fn test_important_flag() {
        let decls = parse_inline_declarations("color: red !important").unwrap();
        assert!(decls[0].important);
        assert_eq!(decls[0].value, "red");
    }

    #[test]
    fn test_bad_selector_drops_only_its_rule() {
        let stylesheet = CssParser::new().parse("a > { color: red } p { color: green }");
        assert_eq!(stylesheet.len(), 1);
        assert_eq!(stylesheet.rules[0].selectors[0].text, "p");
    }

    #[test]
    fn test_malformed_inline_declaration_fails() {
        assert!(matches!(
            parse_inline_declarations("color red"),
            Err(CssError::InvalidDeclaration(_))
        ));
    }
}
