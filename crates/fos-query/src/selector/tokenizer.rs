//! Selector tokenizer
//!
//! Splits a selector on top-level commas and scans every alternative into
//! a flat token sequence. Scanning works on chars, so non-ASCII names and
//! attribute values survive untouched.
//!
//! Whitespace is significant only between two compounds, where it becomes
//! a descendant combinator; around `>`, `+` and `~` it is dropped.

use std::fmt;
use std::str::FromStr;

use super::pseudo::PseudoClass;
use crate::error::{QueryError, Result};

/// Structural relation between two compounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// ` `
    Descendant,
    /// `>`
    Child,
    /// `~`
    GeneralSibling,
    /// `+`
    AdjacentSibling,
}

/// Attribute value test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeMatcher {
    /// `[attr=value]`
    Exact(String),
    /// `[attr^=value]`
    Prefix(String),
    /// `[attr*=value]`
    Substring(String),
    /// `[attr$=value]`
    Suffix(String),
}

/// `[name]`, `[name=value]` and the prefix/substring/suffix variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    /// Trailing ` i` flag
    pub case_insensitive: bool,
}

impl AttributeSelector {
    /// Check an attribute value (`None` when the attribute is absent)
    pub fn matches(&self, value: Option<&str>) -> bool {
        let (Some(matcher), Some(value)) = (&self.matcher, value) else {
            return self.matcher.is_none() && value.is_some();
        };
        let fold = |s: &str| {
            if self.case_insensitive {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };
        let value = fold(value);
        match matcher {
            AttributeMatcher::Exact(expected) => value == fold(expected),
            AttributeMatcher::Prefix(expected) => value.starts_with(&fold(expected)),
            AttributeMatcher::Substring(expected) => value.contains(&fold(expected)),
            AttributeMatcher::Suffix(expected) => value.ends_with(&fold(expected)),
        }
    }

    /// `[nodeType=N]` tests the node's type code instead of an attribute
    pub fn is_node_type_test(&self) -> bool {
        self.name == "nodeType"
    }

    /// Can be evaluated as a path predicate
    pub fn is_path_expressible(&self) -> bool {
        !self.case_insensitive && matches!(self.matcher, None | Some(AttributeMatcher::Exact(_)))
    }
}

/// One selector token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Tag name, optionally namespace-prefixed (`ns|tag`)
    Tag { prefix: Option<String>, name: String },
    /// `*`
    Universal,
    /// `#id`
    Id(String),
    /// `.a.b`, consecutive classes folded into one token
    Classes(Vec<String>),
    Attribute(AttributeSelector),
    Pseudo(PseudoClass),
    Combinator(Combinator),
}

impl Token {
    /// Un-prefixed tag token
    pub fn tag(name: impl Into<String>) -> Self {
        Token::Tag {
            prefix: None,
            name: name.into(),
        }
    }
}

/// Qualified tag name as stored in the tree (`prefix:name`)
pub(crate) fn qualified_name(prefix: &Option<String>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{name}"),
        None => name.to_string(),
    }
}

/// Where an alternative starts relative to its context nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Anywhere below the context
    #[default]
    Descendant,
    /// Direct children only (leading `>`)
    Child,
}

/// One comma-separated branch of a selector
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alternative {
    pub scope: Scope,
    pub tokens: Vec<Token>,
}

impl Alternative {
    /// Contains a combinator or starts at child scope
    pub fn is_complex(&self) -> bool {
        self.scope == Scope::Child || self.tokens.iter().any(|t| matches!(t, Token::Combinator(_)))
    }
}

/// Tokenized selector
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    source: String,
    alternatives: Vec<Alternative>,
}

impl Selector {
    /// Tokenize `text`; empty alternatives are skipped
    pub fn parse(text: &str) -> Result<Self> {
        let chars: Vec<char> = text.chars().collect();
        let mut alternatives = Vec::new();
        for part in split_alternatives(&chars)? {
            let alternative = tokenize_alternative(part, text)?;
            if !alternative.tokens.is_empty() {
                alternatives.push(alternative);
            }
        }
        Ok(Self {
            source: text.to_string(),
            alternatives,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }
}

impl FromStr for Selector {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Shorthand for `Selector::parse(text).map(|s| s.alternatives)`
pub fn tokenize(text: &str) -> Result<Vec<Alternative>> {
    Selector::parse(text).map(|s| s.alternatives)
}

fn split_alternatives(chars: &[char]) -> Result<Vec<&[char]>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '[') | (None, '(') => depth += 1,
            (None, ']') | (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&chars[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err(QueryError::Selector("unterminated string".to_string()));
    }
    parts.push(&chars[start..]);
    Ok(parts)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

struct Scanner<'a> {
    chars: &'a [char],
    pos: usize,
    source: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(chars: &'a [char], source: &'a str) -> Self {
        Self {
            chars,
            pos: 0,
            source,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, message: impl fmt::Display) -> QueryError {
        QueryError::Selector(format!("{message} in '{}'", self.source))
    }

    /// Name characters, honouring backslash escapes
    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                if let Some(escaped) = self.bump() {
                    out.push(escaped);
                }
            } else if is_ident_char(c) {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    fn required_ident(&mut self, after: char) -> Result<String> {
        let name = self.ident();
        if name.is_empty() {
            return Err(self.error(format_args!("expected a name after '{after}'")));
        }
        Ok(name)
    }

    /// Content between the bracket at the cursor and its partner
    fn balanced(&mut self, open: char, close: char) -> Result<String> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        while let Some(c) = self.bump() {
            match (quote, c) {
                (_, '\\') => {
                    self.bump();
                }
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(c),
                (None, c) if c == open => depth += 1,
                (None, c) if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.chars[start + 1..self.pos - 1].iter().collect());
                    }
                }
                _ => {}
            }
        }
        Err(self.error(format_args!("unclosed '{open}'")))
    }

    /// Tag name, `ns|tag` or `|tag`; the cursor sits on the first char
    fn tag(&mut self) -> Result<Token> {
        let first = if self.peek() == Some('|') {
            String::new()
        } else {
            self.ident()
        };
        if self.peek() != Some('|') {
            return Ok(Token::tag(first));
        }
        self.pos += 1;
        if self.peek() == Some('*') {
            self.pos += 1;
            return Ok(Token::Universal);
        }
        let name = self.required_ident('|')?;
        let prefix = (!first.is_empty()).then_some(first);
        Ok(Token::Tag { prefix, name })
    }
}

fn tokenize_alternative(chars: &[char], source: &str) -> Result<Alternative> {
    let mut scanner = Scanner::new(chars, source);
    let mut tokens: Vec<Token> = Vec::new();
    let mut pending_space = false;

    while let Some(c) = scanner.peek() {
        if c.is_whitespace() {
            pending_space = true;
            scanner.pos += 1;
            continue;
        }

        let combinator = match c {
            '>' => Some(Combinator::Child),
            '~' => Some(Combinator::GeneralSibling),
            '+' => Some(Combinator::AdjacentSibling),
            _ => None,
        };
        if let Some(combinator) = combinator {
            scanner.pos += 1;
            pending_space = false;
            if matches!(tokens.last(), Some(Token::Combinator(_))) {
                return Err(scanner.error(format_args!("unexpected '{c}'")));
            }
            tokens.push(Token::Combinator(combinator));
            continue;
        }

        if pending_space && !tokens.is_empty() && !matches!(tokens.last(), Some(Token::Combinator(_))) {
            tokens.push(Token::Combinator(Combinator::Descendant));
        }
        pending_space = false;

        let token = match c {
            '#' => {
                scanner.pos += 1;
                Token::Id(scanner.required_ident('#')?)
            }
            '.' => {
                let mut classes = Vec::new();
                while scanner.peek() == Some('.') {
                    scanner.pos += 1;
                    classes.push(scanner.required_ident('.')?);
                }
                Token::Classes(classes)
            }
            '[' => {
                let content = scanner.balanced('[', ']')?;
                Token::Attribute(parse_attribute(&content).map_err(|msg| scanner.error(msg))?)
            }
            ':' => {
                scanner.pos += 1;
                if scanner.peek() == Some(':') {
                    return Err(scanner.error("pseudo-elements are not supported"));
                }
                let name = scanner.required_ident(':')?;
                let args = if scanner.peek() == Some('(') {
                    Some(scanner.balanced('(', ')')?)
                } else {
                    None
                };
                Token::Pseudo(PseudoClass::parse(&name, args.as_deref())?)
            }
            '*' => {
                scanner.pos += 1;
                if scanner.peek() == Some('|') {
                    scanner.tag()?
                } else {
                    Token::Universal
                }
            }
            c if is_ident_char(c) || c == '\\' || c == '|' => scanner.tag()?,
            other => return Err(scanner.error(format_args!("unexpected '{other}'"))),
        };
        tokens.push(token);
    }

    let mut scope = Scope::Descendant;
    if let Some(Token::Combinator(leading)) = tokens.first() {
        if *leading == Combinator::Child {
            scope = Scope::Child;
        }
        tokens.remove(0);
    }
    if matches!(tokens.last(), Some(Token::Combinator(_))) {
        return Err(scanner.error("dangling combinator"));
    }
    if matches!(tokens.first(), Some(Token::Pseudo(_))) {
        tokens.insert(0, Token::Universal);
    }

    Ok(Alternative { scope, tokens })
}

/// Parse the inside of `[...]`
fn parse_attribute(content: &str) -> std::result::Result<AttributeSelector, String> {
    let content = content.trim();
    let Some(eq) = content.find('=') else {
        return attribute_name(content).map(|name| AttributeSelector {
            name,
            matcher: None,
            case_insensitive: false,
        });
    };

    let (raw_name, raw_value) = (content[..eq].trim_end(), &content[eq + 1..]);
    let modifier_stripped = raw_name.get(..raw_name.len().saturating_sub(1)).unwrap_or("");
    let (raw_name, build): (&str, fn(String) -> AttributeMatcher) = match raw_name.chars().last() {
        Some('^') => (modifier_stripped, AttributeMatcher::Prefix),
        Some('*') => (modifier_stripped, AttributeMatcher::Substring),
        Some('$') => (modifier_stripped, AttributeMatcher::Suffix),
        Some(op @ ('~' | '|' | '!')) => return Err(format!("unsupported attribute operator '{op}='")),
        _ => (raw_name, AttributeMatcher::Exact),
    };
    let name = attribute_name(raw_name)?;
    let (value, case_insensitive) = attribute_value(raw_value.trim())?;
    Ok(AttributeSelector {
        name,
        matcher: Some(build(value)),
        case_insensitive,
    })
}

fn attribute_name(raw: &str) -> std::result::Result<String, String> {
    let name = raw.trim();
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(format!("invalid attribute name '{name}'"));
    }
    Ok(name.to_string())
}

/// Quoted or bare value, optionally followed by the ` i` flag
fn attribute_value(raw: &str) -> std::result::Result<(String, bool), String> {
    let (value, rest) = match raw.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let body = &raw[1..];
            let close = body.find(q).ok_or_else(|| "unterminated string".to_string())?;
            (body[..close].to_string(), body[close + 1..].trim())
        }
        _ => match raw.split_once(char::is_whitespace) {
            Some((value, rest)) => (value.to_string(), rest.trim()),
            None => (raw.to_string(), ""),
        },
    };
    match rest {
        "" => Ok((value, false)),
        flag if flag.eq_ignore_ascii_case("i") => Ok((value, true)),
        other => Err(format!("unexpected '{other}' after attribute value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(selector: &str) -> Vec<Vec<Token>> {
        tokenize(selector)
            .unwrap()
            .into_iter()
            .map(|a| a.tokens)
            .collect()
    }

    #[test]
    fn test_two_alternatives() {
        let parsed = tokens("div.a.b, span#x > p");
        assert_eq!(
            parsed,
            vec![
                vec![Token::tag("div"), Token::Classes(vec!["a".into(), "b".into()])],
                vec![
                    Token::tag("span"),
                    Token::Id("x".into()),
                    Token::Combinator(Combinator::Child),
                    Token::tag("p"),
                ],
            ]
        );
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(tokens("ul    li"), tokens("ul li"));
        assert_eq!(tokens("ul  >  li"), tokens("ul>li"));
        assert_eq!(tokens("h1 ~   p")[0][1], Token::Combinator(Combinator::GeneralSibling));
        assert_eq!(tokens("h1+p")[0][1], Token::Combinator(Combinator::AdjacentSibling));
    }

    #[test]
    fn test_leading_combinators() {
        let alternatives = tokenize("> li").unwrap();
        assert_eq!(alternatives[0].scope, Scope::Child);
        assert_eq!(alternatives[0].tokens, vec![Token::tag("li")]);

        let alternatives = tokenize("~ li").unwrap();
        assert_eq!(alternatives[0].scope, Scope::Descendant);
        assert_eq!(alternatives[0].tokens, vec![Token::tag("li")]);
    }

    #[test]
    fn test_pseudo_first_gets_universal() {
        let parsed = tokens(":first");
        assert_eq!(parsed[0], vec![Token::Universal, Token::Pseudo(PseudoClass::First)]);
    }

    #[test]
    fn test_attributes() {
        let parsed = tokens("a[href^='http'][title=\"a, b\"][data-x][rel$=ext i]");
        let attrs: Vec<_> = parsed[0]
            .iter()
            .filter_map(|t| match t {
                Token::Attribute(a) => Some(a.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs[0].matcher, Some(AttributeMatcher::Prefix("http".into())));
        assert_eq!(attrs[1].matcher, Some(AttributeMatcher::Exact("a, b".into())));
        assert_eq!(attrs[2].matcher, None);
        assert!(attrs[3].case_insensitive);
        assert!(attrs[3].matches(Some("file.EXT")));
    }

    #[test]
    fn test_namespaced_tag() {
        assert_eq!(
            tokens("dc|title")[0],
            vec![Token::Tag {
                prefix: Some("dc".into()),
                name: "title".into()
            }]
        );
        assert_eq!(qualified_name(&Some("dc".into()), "title"), "dc:title");
    }

    #[test]
    fn test_unicode_names() {
        assert_eq!(tokens("div.größe")[0][1], Token::Classes(vec!["größe".into()]));
        assert_eq!(tokens("#日本")[0][0], Token::Id("日本".into()));
    }

    #[test]
    fn test_nested_pseudo_arguments() {
        let parsed = tokens("li:not(.a, [b='c)'])");
        match &parsed[0][1] {
            Token::Pseudo(PseudoClass::Not(inner)) => assert_eq!(inner.alternatives().len(), 2),
            other => panic!("unexpected token {other:?}"),
        }
    }

    #[test]
    fn test_errors() {
        assert!(Selector::parse("div >").is_err());
        assert!(Selector::parse("div > > p").is_err());
        assert!(Selector::parse("a[href").is_err());
        assert!(Selector::parse("p::before").is_err());
        assert!(Selector::parse("p:bogus").is_err());
        assert!(Selector::parse("a[x~=y]").is_err());
        assert!(Selector::parse("#").is_err());
        assert!(Selector::parse("div ! p").is_err());
    }

    #[test]
    fn test_empty_alternatives_are_dropped() {
        assert!(Selector::parse("").unwrap().is_empty());
        assert_eq!(Selector::parse("a,,b").unwrap().alternatives().len(), 2);
    }
}
