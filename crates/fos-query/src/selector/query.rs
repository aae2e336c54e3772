//! Query executor
//!
//! Each alternative is walked left to right. Tokens a path step can
//! express (tags, ids, attribute presence and equality) accumulate into a
//! [`PathExpr`]. Anything else forces a flush: the pending expression is
//! evaluated once per candidate, anchored at the candidate's absolute
//! path, and the remaining test then narrows the flushed list in memory.
//!
//! Alternatives are unioned in order with duplicates removed; the first
//! alternative's matches come first.

use std::collections::HashSet;

use fos_dom::{Axis, Document, NameTest, NodeId, PathCache, PathExpr, Predicate, TemporaryAttach};

use super::filter::has_classes;
use super::tokenizer::{qualified_name, Alternative, AttributeMatcher, Combinator, Scope, Selector, Token};
use crate::error::Result;

/// Descendants of `context` matching `selector`, without duplicates
pub fn find(document: &mut Document, context: &[NodeId], selector: &Selector) -> Result<Vec<NodeId>> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for alternative in selector.alternatives() {
        for node in run_alternative(document, context, alternative)? {
            if seen.insert(node) {
                result.push(node);
            }
        }
    }
    tracing::debug!(selector = %selector, context = context.len(), matched = result.len(), "find");
    Ok(result)
}

/// Compilation state of one alternative
struct Plan {
    candidates: Vec<NodeId>,
    expr: PathExpr,
    /// Axis waiting for the next step
    axis: Option<Axis>,
}

impl Plan {
    /// Make sure a step exists for a predicate or in-memory test to act on
    fn open_step(&mut self) {
        if let Some(axis) = self.axis.take() {
            self.expr.push_step(axis, NameTest::Any);
        }
    }

    fn flush(&mut self, document: &mut Document) -> Result<()> {
        let expr = self.expr.take();
        if expr.is_empty() {
            return Ok(());
        }
        tracing::trace!(path = %expr, anchors = self.candidates.len(), "flushing path fragment");

        let mut found = Vec::new();
        let mut shared = PathCache::new();
        for &node in &self.candidates {
            let guard = TemporaryAttach::new(document, node)?;
            // attaching reshapes the tree, so such anchors get their own cache
            let mut scratch = PathCache::new();
            let cache = if guard.is_attached() { &mut scratch } else { &mut shared };
            let path = guard.tree.path_of_with(node, cache)?;
            found.extend(guard.evaluate_with(&path, &expr, cache)?);
        }
        self.candidates = found;
        Ok(())
    }
}

fn run_alternative(document: &mut Document, context: &[NodeId], alternative: &Alternative) -> Result<Vec<NodeId>> {
    let mut plan = Plan {
        candidates: context
            .iter()
            .copied()
            .filter(|&n| n == NodeId::ROOT || document.tree.is_element(n))
            .collect(),
        expr: PathExpr::new(),
        axis: Some(match alternative.scope {
            Scope::Descendant => Axis::Descendant,
            Scope::Child => Axis::Child,
        }),
    };

    for token in &alternative.tokens {
        if plan.candidates.is_empty() {
            return Ok(Vec::new());
        }
        match token {
            Token::Tag { prefix, name } => {
                let axis = plan.axis.take().unwrap_or(Axis::SelfNode);
                plan.expr.push_step(axis, NameTest::Name(qualified_name(prefix, name)));
            }
            Token::Universal => {
                let axis = plan.axis.take().unwrap_or(Axis::SelfNode);
                plan.expr.push_step(axis, NameTest::Any);
            }
            Token::Id(id) => {
                plan.open_step();
                plan.expr
                    .push_predicate(Predicate::AttributeEquals("id".to_string(), id.clone()));
            }
            Token::Attribute(attr) if attr.is_path_expressible() => {
                plan.open_step();
                let predicate = match &attr.matcher {
                    Some(AttributeMatcher::Exact(value)) => Predicate::AttributeEquals(attr.name.clone(), value.clone()),
                    _ => Predicate::HasAttribute(attr.name.clone()),
                };
                plan.expr.push_predicate(predicate);
            }
            Token::Attribute(attr) => {
                plan.open_step();
                plan.expr.push_predicate(Predicate::HasAttribute(attr.name.clone()));
                plan.flush(document)?;
                let tree = &document.tree;
                plan.candidates
                    .retain(|&n| attr.matches(tree.get_attribute(n, &attr.name)));
            }
            Token::Classes(classes) => {
                plan.open_step();
                plan.expr.push_predicate(Predicate::HasAttribute("class".to_string()));
                plan.flush(document)?;
                let tree = &document.tree;
                plan.candidates
                    .retain(|&n| has_classes(tree.get_attribute(n, "class"), classes));
            }
            Token::Combinator(Combinator::Descendant) => plan.axis = Some(Axis::Descendant),
            Token::Combinator(Combinator::Child) => plan.axis = Some(Axis::Child),
            Token::Combinator(sibling) => {
                plan.flush(document)?;
                plan.candidates = siblings(document, &plan.candidates, *sibling);
            }
            Token::Pseudo(pseudo) => {
                plan.open_step();
                plan.flush(document)?;
                let candidates = std::mem::take(&mut plan.candidates);
                plan.candidates = pseudo.apply(document, candidates)?;
            }
        }
    }

    // a trailing axis with no step to carry it is dropped
    plan.axis = None;
    plan.flush(document)?;
    Ok(plan.candidates)
}

/// `~`: every following element sibling; `+`: the next one
fn siblings(document: &Document, candidates: &[NodeId], combinator: Combinator) -> Vec<NodeId> {
    let tree = &document.tree;
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for &node in candidates {
        let mut next = tree.next_element_sibling(node);
        while let Some(sibling) = next {
            if seen.insert(sibling) {
                out.push(sibling);
            }
            if combinator == Combinator::AdjacentSibling {
                break;
            }
            next = tree.next_element_sibling(sibling);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::DocumentKind;

    /// <div id="a" class="box"><p class="x">1</p><p>2</p><span/></div><p class="x y">3</p>
    fn sample() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new(DocumentKind::Html, "UTF-8");
        let div = doc.create_element("div");
        doc.tree.set_attribute(div, "id", "a");
        doc.tree.set_attribute(div, "class", "box");
        doc.tree.append_child(NodeId::ROOT, div).unwrap();

        let p1 = doc.create_element("p");
        doc.tree.set_attribute(p1, "class", "x");
        let p2 = doc.create_element("p");
        let span = doc.create_element("span");
        for child in [p1, p2, span] {
            doc.tree.append_child(div, child).unwrap();
        }
        let p3 = doc.create_element("p");
        doc.tree.set_attribute(p3, "class", "x y");
        doc.tree.append_child(NodeId::ROOT, p3).unwrap();
        (doc, vec![div, p1, p2, span, p3])
    }

    fn run(doc: &mut Document, context: &[NodeId], selector: &str) -> Vec<NodeId> {
        find(doc, context, &Selector::parse(selector).unwrap()).unwrap()
    }

    #[test]
    fn test_tag_and_id() {
        let (mut doc, n) = sample();
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "p"), vec![n[1], n[2], n[4]]);
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "#a"), vec![n[0]]);
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "div#a > p"), vec![n[1], n[2]]);
    }

    #[test]
    fn test_classes_flush() {
        let (mut doc, n) = sample();
        assert_eq!(run(&mut doc, &[NodeId::ROOT], ".x"), vec![n[1], n[4]]);
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "p.y.x"), vec![n[4]]);
        assert_eq!(run(&mut doc, &[NodeId::ROOT], ".box p.x"), vec![n[1]]);
    }

    #[test]
    fn test_context_scope() {
        let (mut doc, n) = sample();
        assert_eq!(run(&mut doc, &[n[0]], "p"), vec![n[1], n[2]]);
        assert_eq!(run(&mut doc, &[n[0]], "> span"), vec![n[3]]);
        assert!(run(&mut doc, &[n[1]], "p").is_empty());
    }

    #[test]
    fn test_sibling_combinators() {
        let (mut doc, n) = sample();
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "p.x ~ span"), vec![n[3]]);
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "p.x + p"), vec![n[2]]);
        assert!(run(&mut doc, &[NodeId::ROOT], "p.x + span").is_empty());
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "div ~ .x"), vec![n[4]]);
    }

    #[test]
    fn test_pseudo_after_descendant() {
        let (mut doc, n) = sample();
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "div :first"), vec![n[1]]);
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "p:last"), vec![n[4]]);
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "p:eq(1)"), vec![n[2]]);
    }

    #[test]
    fn test_union_dedups_in_first_seen_order() {
        let (mut doc, n) = sample();
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "span, p, .x"), vec![n[3], n[1], n[2], n[4]]);
    }

    #[test]
    fn test_detached_context_is_restored() {
        let (mut doc, n) = sample();
        doc.tree.detach(n[0]);
        assert_eq!(run(&mut doc, &[n[0]], "p.x"), vec![n[1]]);
        assert_eq!(doc.tree.parent(n[0]), None);
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "p"), vec![n[4]]);
    }

    #[test]
    fn test_attribute_operators() {
        let (mut doc, n) = sample();
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "[class^=bo]"), vec![n[0]]);
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "p[class$=y]"), vec![n[4]]);
        assert_eq!(run(&mut doc, &[NodeId::ROOT], "[class='x']"), vec![n[1]]);
    }
}
