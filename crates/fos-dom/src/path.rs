//! Node paths and path queries
//!
//! `NodePath` is the absolute location of a connected node, written as
//! `/tag[i]/tag[j]` with indices counted among same-name element siblings.
//! `PathExpr` is a compiled location expression evaluated relative to a
//! `NodePath` by [`Document::evaluate`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::{Document, DomError, DomResult, DomTree, NodeId};

/// One step of an absolute node path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    /// Serialized tag name
    pub name: String,
    /// 1-based position among same-name element siblings
    pub index: usize,
}

/// Absolute path of a connected node; empty for the document node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePath {
    pub steps: Vec<PathStep>,
}

impl NodePath {
    /// Path of the document node
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("/");
        }
        for step in &self.steps {
            write!(f, "/{}[{}]", step.name, step.index)?;
        }
        Ok(())
    }
}

/// Same-name sibling groups, memoized between path operations
///
/// Only valid while the tree is not mutated; start a new cache after any
/// insertion or removal.
#[derive(Debug, Default)]
pub struct PathCache {
    groups: HashMap<(NodeId, String), Vec<NodeId>>,
    positions: HashMap<NodeId, usize>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element children of `parent` named `name`, in order
    fn group(&mut self, tree: &DomTree, parent: NodeId, name: &str) -> &[NodeId] {
        let positions = &mut self.positions;
        self.groups
            .entry((parent, name.to_string()))
            .or_insert_with(|| {
                let members: Vec<NodeId> = tree
                    .element_children(parent)
                    .filter(|&c| tree.tag_name(c).as_deref() == Some(name))
                    .collect();
                for (i, &member) in members.iter().enumerate() {
                    positions.insert(member, i + 1);
                }
                members
            })
            .as_slice()
    }

    /// 1-based position of `node` among its same-name siblings
    fn position(&mut self, tree: &DomTree, parent: NodeId, node: NodeId, name: &str) -> usize {
        if let Some(&position) = self.positions.get(&node) {
            return position;
        }
        self.group(tree, parent, name);
        self.positions.get(&node).copied().unwrap_or(1)
    }
}

impl DomTree {
    /// Absolute path of a connected element or the document node
    pub fn path_of(&self, id: NodeId) -> DomResult<NodePath> {
        self.path_of_with(id, &mut PathCache::new())
    }

    pub fn path_of_with(&self, id: NodeId, cache: &mut PathCache) -> DomResult<NodePath> {
        if !self.is_connected(id) {
            return Err(DomError::PathNotResolved(format!("node {id} is detached")));
        }
        let mut steps = Vec::new();
        let mut current = id;
        while current != NodeId::ROOT {
            let name = self
                .tag_name(current)
                .ok_or_else(|| DomError::PathNotResolved(format!("node {id} is not an element")))?;
            let parent = self.parent(current).ok_or(DomError::NotFound)?;
            let index = cache.position(self, parent, current, &name);
            steps.push(PathStep { name, index });
            current = parent;
        }
        steps.reverse();
        Ok(NodePath { steps })
    }

    /// Walk an absolute path back to a node
    pub fn resolve_path(&self, path: &NodePath) -> DomResult<NodeId> {
        self.resolve_path_with(path, &mut PathCache::new())
    }

    pub fn resolve_path_with(&self, path: &NodePath, cache: &mut PathCache) -> DomResult<NodeId> {
        let mut current = NodeId::ROOT;
        for step in &path.steps {
            current = cache
                .group(self, current, &step.name)
                .get(step.index.saturating_sub(1))
                .copied()
                .ok_or_else(|| DomError::PathNotResolved(path.to_string()))?;
        }
        Ok(current)
    }
}

/// Step axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    SelfNode,
}

/// Node test of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// `*`
    Any,
    /// Tag name, matched with the document's name rules
    Name(String),
}

/// Attribute predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    HasAttribute(String),
    AttributeEquals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub test: NameTest,
    pub predicates: Vec<Predicate>,
}

/// Compiled location expression
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathExpr {
    pub steps: Vec<Step>,
}

impl PathExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Start a new step
    pub fn push_step(&mut self, axis: Axis, test: NameTest) {
        self.steps.push(Step {
            axis,
            test,
            predicates: Vec::new(),
        });
    }

    /// Attach a predicate to the current step, opening a self step if none
    pub fn push_predicate(&mut self, predicate: Predicate) {
        if self.steps.is_empty() {
            self.push_step(Axis::SelfNode, NameTest::Any);
        }
        if let Some(step) = self.steps.last_mut() {
            step.predicates.push(predicate);
        }
    }

    /// Take the accumulated steps, leaving the expression empty
    pub fn take(&mut self) -> PathExpr {
        std::mem::take(self)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step.axis {
                Axis::Child => f.write_str("/")?,
                Axis::Descendant => f.write_str("//")?,
                Axis::SelfNode => f.write_str("self::")?,
            }
            match &step.test {
                NameTest::Any => f.write_str("*")?,
                NameTest::Name(name) => f.write_str(name)?,
            }
            for predicate in &step.predicates {
                match predicate {
                    Predicate::HasAttribute(name) => write!(f, "[@{name}]")?,
                    Predicate::AttributeEquals(name, value) => write!(f, "[@{name}='{value}']")?,
                }
            }
        }
        Ok(())
    }
}

impl Document {
    /// Evaluate `expr` relative to the node at `context`
    ///
    /// Results are in document order and free of duplicates.
    pub fn evaluate(&self, context: &NodePath, expr: &PathExpr) -> DomResult<Vec<NodeId>> {
        self.evaluate_with(context, expr, &mut PathCache::new())
    }

    /// [`Document::evaluate`] resolving `context` through `cache`
    pub fn evaluate_with(&self, context: &NodePath, expr: &PathExpr, cache: &mut PathCache) -> DomResult<Vec<NodeId>> {
        let start = self.tree.resolve_path_with(context, cache)?;
        let mut current = vec![start];
        // positions within the context subtree, built once several anchors can interleave
        let mut order: Option<HashMap<NodeId, usize>> = None;

        for step in &expr.steps {
            let mut seen = HashSet::new();
            let mut next = Vec::new();
            for &node in &current {
                let candidates: Vec<NodeId> = match step.axis {
                    Axis::Child => self.tree.children(node).collect(),
                    Axis::Descendant => self.tree.descendants(node).collect(),
                    Axis::SelfNode => vec![node],
                };
                for candidate in candidates {
                    if self.step_matches(step, candidate) && seen.insert(candidate) {
                        next.push(candidate);
                    }
                }
            }
            if current.len() > 1 {
                let order = order.get_or_insert_with(|| {
                    std::iter::once(start)
                        .chain(self.tree.descendants(start))
                        .enumerate()
                        .map(|(i, id)| (id, i))
                        .collect()
                });
                next.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
            }
            current = next;
            if current.is_empty() {
                break;
            }
        }
        Ok(current)
    }

    fn step_matches(&self, step: &Step, node: NodeId) -> bool {
        let test_ok = match &step.test {
            NameTest::Any => self.tree.is_element(node) || (step.axis == Axis::SelfNode && node == NodeId::ROOT),
            NameTest::Name(name) => self.tag_matches(node, name),
        };
        test_ok
            && step.predicates.iter().all(|p| match p {
                Predicate::HasAttribute(name) => self.tree.has_attribute(node, name),
                Predicate::AttributeEquals(name, value) => {
                    self.tree.get_attribute(node, name) == Some(value.as_str())
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentKind;

    fn list_document() -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new(DocumentKind::Html, "UTF-8");
        let ul = doc.create_element("ul");
        doc.tree.append_child(NodeId::ROOT, ul).unwrap();
        let mut items = Vec::new();
        for i in 0..3 {
            let li = doc.create_element("li");
            doc.tree.set_attribute(li, "data-i", i.to_string());
            doc.tree.append_child(ul, li).unwrap();
            items.push(li);
        }
        (doc, ul, items)
    }

    #[test]
    fn test_path_roundtrip() {
        let (doc, _, items) = list_document();
        let path = doc.tree.path_of(items[2]).unwrap();
        assert_eq!(path.to_string(), "/ul[1]/li[3]");
        assert_eq!(doc.tree.resolve_path(&path).unwrap(), items[2]);
        assert_eq!(doc.tree.path_of(NodeId::ROOT).unwrap().to_string(), "/");
    }

    #[test]
    fn test_detached_path_fails() {
        let (mut doc, _, items) = list_document();
        doc.tree.detach(items[0]);
        assert!(matches!(doc.tree.path_of(items[0]), Err(DomError::PathNotResolved(_))));
    }

    #[test]
    fn test_evaluate_descendant_with_predicate() {
        let (doc, _, items) = list_document();
        let mut expr = PathExpr::new();
        expr.push_step(Axis::Descendant, NameTest::Name("li".into()));
        expr.push_predicate(Predicate::AttributeEquals("data-i".into(), "1".into()));
        assert_eq!(expr.to_string(), "//li[@data-i='1']");

        let found = doc.evaluate(&NodePath::root(), &expr).unwrap();
        assert_eq!(found, vec![items[1]]);
    }

    #[test]
    fn test_evaluate_child_axis_in_document_order() {
        let (doc, ul, items) = list_document();
        let mut expr = PathExpr::new();
        expr.push_step(Axis::Child, NameTest::Any);
        let context = doc.tree.path_of(ul).unwrap();
        assert_eq!(doc.evaluate(&context, &expr).unwrap(), items);
    }

    #[test]
    fn test_predicate_without_step_tests_context() {
        let (doc, ul, _) = list_document();
        let mut expr = PathExpr::new();
        expr.push_predicate(Predicate::HasAttribute("data-i".into()));
        let context = doc.tree.path_of(ul).unwrap();
        assert!(doc.evaluate(&context, &expr).unwrap().is_empty());
    }

    #[test]
    fn test_cached_paths_agree_with_uncached() {
        let (mut doc, ul, mut items) = list_document();
        let p = doc.create_element("p");
        doc.tree.insert_before(ul, p, Some(items[1])).unwrap();
        items.push(p);

        let mut cache = PathCache::new();
        for &node in &items {
            let path = doc.tree.path_of_with(node, &mut cache).unwrap();
            assert_eq!(path, doc.tree.path_of(node).unwrap());
            assert_eq!(doc.tree.resolve_path_with(&path, &mut cache).unwrap(), node);
        }
        assert_eq!(doc.tree.path_of_with(items[1], &mut cache).unwrap().to_string(), "/ul[1]/li[2]");
    }

    #[test]
    fn test_nested_anchors_are_put_in_document_order() {
        let mut doc = Document::new(DocumentKind::Html, "UTF-8");
        let div = doc.create_element("div");
        let p = doc.create_element("p");
        let inner = doc.create_element("span");
        let outer = doc.create_element("span");
        doc.tree.append_child(NodeId::ROOT, div).unwrap();
        doc.tree.append_child(div, p).unwrap();
        doc.tree.append_child(p, inner).unwrap();
        doc.tree.append_child(div, outer).unwrap();

        let mut expr = PathExpr::new();
        expr.push_step(Axis::Descendant, NameTest::Any);
        expr.push_step(Axis::Child, NameTest::Name("span".into()));
        assert_eq!(doc.evaluate(&NodePath::root(), &expr).unwrap(), vec![inner, outer]);
    }
}
