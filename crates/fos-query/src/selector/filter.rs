//! Filter executor
//!
//! Refines a candidate list without running any path query. Node tests
//! run first, then the alternative's pseudo-classes over the survivors.
//! Results of the alternatives are concatenated as they come: a node
//! matched by two alternatives appears twice.

use fos_dom::{Document, NodeId};

use super::tokenizer::{qualified_name, Alternative, Selector, Token};
use crate::error::Result;

/// Candidates matching `selector`, in candidate order per alternative
pub fn filter(document: &mut Document, nodes: &[NodeId], selector: &Selector) -> Result<Vec<NodeId>> {
    let mut result = Vec::new();
    for alternative in selector.alternatives() {
        let mut matched: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|&node| matches_alternative(document, node, alternative))
            .collect();
        for token in &alternative.tokens {
            if let Token::Pseudo(pseudo) = token {
                matched = pseudo.apply(document, matched)?;
            }
        }
        result.extend(matched);
    }
    tracing::debug!(selector = %selector, candidates = nodes.len(), matched = result.len(), "filter");
    Ok(result)
}

/// Any candidate matches
pub fn is(document: &mut Document, nodes: &[NodeId], selector: &Selector) -> Result<bool> {
    Ok(!filter(document, nodes, selector)?.is_empty())
}

/// Node tests of one alternative, pseudo-classes excluded
///
/// Combinators never match here. Non-element nodes only pass
/// `[nodeType=N]` tests.
pub fn matches_alternative(document: &Document, node: NodeId, alternative: &Alternative) -> bool {
    if alternative.is_complex() {
        return false;
    }
    let tree = &document.tree;
    let Some(node_type) = tree.get(node).map(|n| n.node_type().code().to_string()) else {
        return false;
    };

    if !tree.is_element(node) {
        let mut tested = false;
        for token in &alternative.tokens {
            match token {
                Token::Attribute(attr) if attr.is_node_type_test() => {
                    if !attr.matches(Some(&node_type)) {
                        return false;
                    }
                    tested = true;
                }
                Token::Universal | Token::Pseudo(_) => {}
                _ => return false,
            }
        }
        return tested;
    }

    alternative.tokens.iter().all(|token| match token {
        Token::Tag { prefix, name } => document.tag_matches(node, &qualified_name(prefix, name)),
        Token::Universal | Token::Pseudo(_) => true,
        Token::Id(id) => tree.get_attribute(node, "id") == Some(id.as_str()),
        Token::Classes(classes) => has_classes(tree.get_attribute(node, "class"), classes),
        Token::Attribute(attr) if attr.is_node_type_test() => attr.matches(Some(&node_type)),
        Token::Attribute(attr) => attr.matches(tree.get_attribute(node, &attr.name)),
        Token::Combinator(_) => false,
    })
}

/// Every class present in a whitespace separated class list
pub(crate) fn has_classes(list: Option<&str>, classes: &[String]) -> bool {
    let Some(list) = list else {
        return classes.is_empty();
    };
    classes
        .iter()
        .all(|class| list.split_whitespace().any(|c| c == class))
}
