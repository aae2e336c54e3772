//! Pseudo-class engine
//!
//! Names are resolved to a closed set of variants while tokenizing, so an
//! unknown pseudo-class fails before any node is touched. Positional
//! variants work on the current candidate order (0-based); the rest test
//! every candidate on its own.

use std::collections::HashSet;
use std::ops::Range;

use fos_dom::{Document, NodeId};

use super::tokenizer::Selector;
use super::{filter, find};
use crate::error::{QueryError, Result};

/// Supported pseudo-classes
#[derive(Debug, Clone, PartialEq)]
pub enum PseudoClass {
    Even,
    Odd,
    Eq(i64),
    Gt(i64),
    Lt(i64),
    First,
    Last,
    /// Lowercased needle
    Contains(String),
    Not(Selector),
    Slice(i64, Option<i64>),
    Has(Selector),
    /// `:submit` / `:reset`: input or button with that type
    ButtonType(&'static str),
    /// `:password`, `:checkbox`, `:radio`, `:hidden`, `:image`, `:file`
    InputType(&'static str),
    Input,
    Parent,
    Disabled,
    Selected,
    Checked,
    Enabled,
    Header,
    OnlyChild,
    FirstChild,
    LastChild,
}

impl PseudoClass {
    /// Resolve `:name` / `:name(args)`
    pub fn parse(name: &str, args: Option<&str>) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        let pseudo = match lower.as_str() {
            "even" => Self::Even,
            "odd" => Self::Odd,
            "eq" => Self::Eq(index_arg(name, args)?),
            "gt" => Self::Gt(index_arg(name, args)?),
            "lt" => Self::Lt(index_arg(name, args)?),
            "first" => Self::First,
            "last" => Self::Last,
            "contains" => Self::Contains(unquote(required(name, args)?).to_lowercase()),
            "not" => Self::Not(Selector::parse(required(name, args)?)?),
            "has" => Self::Has(Selector::parse(required(name, args)?)?),
            "slice" => {
                let raw = required(name, args)?;
                let (start, end) = match raw.split_once(',') {
                    Some((start, end)) => (start, Some(end)),
                    None => (raw, None),
                };
                let end = end.map(|e| parse_index(name, e)).transpose()?;
                Self::Slice(parse_index(name, start)?, end)
            }
            "submit" => Self::ButtonType("submit"),
            "reset" => Self::ButtonType("reset"),
            "password" => Self::InputType("password"),
            "checkbox" => Self::InputType("checkbox"),
            "radio" => Self::InputType("radio"),
            "hidden" => Self::InputType("hidden"),
            "image" => Self::InputType("image"),
            "file" => Self::InputType("file"),
            "input" => Self::Input,
            "parent" => Self::Parent,
            "disabled" => Self::Disabled,
            "selected" => Self::Selected,
            "checked" => Self::Checked,
            "enabled" => Self::Enabled,
            "header" => Self::Header,
            "only-child" => Self::OnlyChild,
            "first-child" => Self::FirstChild,
            "last-child" => Self::LastChild,
            _ => return Err(QueryError::Selector(format!("unknown pseudo-class ':{name}'"))),
        };
        Ok(pseudo)
    }

    /// Narrow `nodes`, keeping their order
    pub fn apply(&self, document: &mut Document, nodes: Vec<NodeId>) -> Result<Vec<NodeId>> {
        match self {
            Self::Not(selector) => {
                let matched: HashSet<NodeId> = filter(document, &nodes, selector)?.into_iter().collect();
                return Ok(nodes.into_iter().filter(|n| !matched.contains(n)).collect());
            }
            Self::Has(selector) => {
                let mut kept = Vec::new();
                for node in nodes {
                    if !find(document, &[node], selector)?.is_empty() {
                        kept.push(node);
                    }
                }
                return Ok(kept);
            }
            _ => {}
        }

        let kept = match self {
            Self::Even => nodes.into_iter().step_by(2).collect(),
            Self::Odd => nodes.into_iter().skip(1).step_by(2).collect(),
            Self::Eq(n) => usize::try_from(*n)
                .ok()
                .and_then(|i| nodes.get(i).copied())
                .into_iter()
                .collect(),
            Self::Gt(n) => positions(nodes, |i| i > *n),
            Self::Lt(n) => positions(nodes, |i| i <= *n),
            Self::First => nodes.into_iter().take(1).collect(),
            Self::Last => nodes.last().copied().into_iter().collect(),
            Self::Slice(start, end) => nodes[slice_bounds(nodes.len(), *start, *end)].to_vec(),
            _ => nodes
                .into_iter()
                .filter(|&node| self.test(document, node))
                .collect(),
        };
        Ok(kept)
    }

    /// Per-node test for the non-positional variants
    fn test(&self, document: &Document, node: NodeId) -> bool {
        let tree = &document.tree;
        let is = |name: &str| document.tag_matches(node, name);
        let has_type = |kind: &str| tree.get_attribute(node, "type") == Some(kind);

        match self {
            Self::Contains(needle) => tree.text_content(node).to_lowercase().contains(needle.as_str()),
            Self::ButtonType(kind) => (is("input") || is("button")) && has_type(*kind),
            Self::InputType(kind) => is("input") && has_type(*kind),
            Self::Input => ["input", "textarea", "select", "button"].iter().any(|t| is(*t)),
            Self::Parent => tree.first_child(node).is_some(),
            Self::Disabled => tree.has_attribute(node, "disabled"),
            Self::Selected => tree.has_attribute(node, "selected"),
            Self::Checked => tree.has_attribute(node, "checked"),
            Self::Enabled => tree.is_element(node) && !tree.has_attribute(node, "disabled"),
            Self::Header => ["h1", "h2", "h3", "h4", "h5", "h6", "h7"].iter().any(|t| is(*t)),
            Self::OnlyChild => {
                tree.is_element(node)
                    && tree.prev_element_sibling(node).is_none()
                    && tree.next_element_sibling(node).is_none()
            }
            Self::FirstChild => tree.is_element(node) && tree.prev_element_sibling(node).is_none(),
            Self::LastChild => tree.is_element(node) && tree.next_element_sibling(node).is_none(),
            _ => true,
        }
    }
}

fn positions(nodes: Vec<NodeId>, keep: impl Fn(i64) -> bool) -> Vec<NodeId> {
    nodes
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep(*i as i64))
        .map(|(_, n)| n)
        .collect()
}

fn required<'a>(name: &str, args: Option<&'a str>) -> Result<&'a str> {
    args.ok_or_else(|| QueryError::Selector(format!("':{name}' needs an argument")))
}

fn index_arg(name: &str, args: Option<&str>) -> Result<i64> {
    parse_index(name, required(name, args)?)
}

fn parse_index(name: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| QueryError::Selector(format!("':{name}' expects an integer, got '{}'", raw.trim())))
}

fn unquote(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Range picked by `slice(start, end)`
///
/// `end` above zero is an exclusive end index and becomes the length
/// `end - start`; zero or below is used as a length directly. A negative
/// start counts from the back, a negative length stops that many items
/// before the end, no `end` runs to the end.
pub(crate) fn slice_bounds(len: usize, start: i64, end: Option<i64>) -> Range<usize> {
    let len = len as i64;
    let from = if start < 0 {
        (len + start).max(0)
    } else {
        start.min(len)
    };
    let to = match end.map(|e| if e > 0 { e.saturating_sub(start) } else { e }) {
        None => len,
        Some(length) if length >= 0 => from.saturating_add(length).min(len),
        Some(length) => (len + length).max(from),
    };
    from as usize..to.max(from) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::DocumentKind;

    fn five() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new(DocumentKind::Html, "UTF-8");
        let ul = doc.create_element("ul");
        doc.tree.append_child(NodeId::ROOT, ul).unwrap();
        let items = (0..5)
            .map(|i| {
                let li = doc.create_element("li");
                let text = doc.tree.create_text(format!("Item {i}"));
                doc.tree.append_child(li, text).unwrap();
                doc.tree.append_child(ul, li).unwrap();
                li
            })
            .collect();
        (doc, items)
    }

    fn run(pseudo: &str, args: Option<&str>) -> Vec<usize> {
        let (mut doc, items) = five();
        let kept = PseudoClass::parse(pseudo, args)
            .unwrap()
            .apply(&mut doc, items.clone())
            .unwrap();
        kept.iter()
            .map(|k| items.iter().position(|i| i == k).unwrap())
            .collect()
    }

    #[test]
    fn test_positional() {
        assert_eq!(run("even", None), vec![0, 2, 4]);
        assert_eq!(run("odd", None), vec![1, 3]);
        assert_eq!(run("first", None), vec![0]);
        assert_eq!(run("last", None), vec![4]);
        assert_eq!(run("gt", Some("2")), vec![3, 4]);
        assert_eq!(run("lt", Some("2")), vec![0, 1, 2]);
    }

    #[test]
    fn test_eq_bounds() {
        assert_eq!(run("eq", Some("3")), vec![3]);
        assert!(run("eq", Some("5")).is_empty());
        assert!(run("eq", Some("-1")).is_empty());
    }

    #[test]
    fn test_slice() {
        assert_eq!(run("slice", Some("1,3")), vec![1, 2]);
        assert_eq!(run("slice", Some("2")), vec![2, 3, 4]);
        assert_eq!(run("slice", Some("-2")), vec![3, 4]);
        assert_eq!(run("slice", Some("1, -1")), vec![1, 2, 3]);
    }

    #[test]
    fn test_slice_bounds_edges() {
        assert_eq!(slice_bounds(5, 0, Some(0)), 0..0);
        assert_eq!(slice_bounds(5, 9, None), 5..5);
        assert_eq!(slice_bounds(0, 1, Some(3)), 0..0);
        // end below start turns into a negative length
        assert_eq!(slice_bounds(5, 3, Some(2)), 3..4);
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        assert_eq!(run("contains", Some("'ITEM 3'")), vec![3]);
    }

    #[test]
    fn test_structural() {
        assert_eq!(run("first-child", None), vec![0]);
        assert_eq!(run("last-child", None), vec![4]);
        assert!(run("only-child", None).is_empty());
        assert_eq!(run("parent", None).len(), 5);
    }

    #[test]
    fn test_parse_errors() {
        assert!(PseudoClass::parse("eq", None).is_err());
        assert!(PseudoClass::parse("eq", Some("x")).is_err());
        assert!(PseudoClass::parse("hover", None).is_err());
        assert_eq!(PseudoClass::parse("FIRST", None).unwrap(), PseudoClass::First);
    }
}
