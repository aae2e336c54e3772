//! Selection: chainable handle on one query state
//!
//! Every step that moves the stack (query, traversal, slicing) records a
//! new state linked to the current one and returns a handle on it;
//! [`Selection::end`] walks that link back. Steps that only change the
//! tree or read from it keep the current state.

use std::collections::HashSet;
use std::fmt;

use fos_dom::{Document, DocumentId, NodeId};

use crate::error::Result;
use crate::selector::{self, slice_bounds, Selector};
use crate::session::{NodeRef, Session};
use crate::state::{QueryState, StateId};

/// Handle on a result set of a [`Session`]
pub struct Selection<'s> {
    pub(crate) session: &'s mut Session,
    id: StateId,
    document: DocumentId,
    nodes: Vec<NodeId>,
}

impl<'s> Selection<'s> {
    pub(crate) fn new(session: &'s mut Session, id: StateId, document: DocumentId, nodes: Vec<NodeId>) -> Self {
        Self {
            session,
            id,
            document,
            nodes,
        }
    }

    // ---- state ----

    /// Arena id of this result set; reopen with [`Session::selection`]
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn document_id(&self) -> DocumentId {
        self.document
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Same as [`Selection::len`]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).copied()
    }

    pub fn node_ref(&self, index: usize) -> Option<NodeRef> {
        self.get(index).map(|node| NodeRef::new(self.document, node))
    }

    /// Stack before the step that produced this state
    pub fn backup(&self) -> &[NodeId] {
        self.session
            .states
            .get(self.id)
            .map(|s| s.backup.as_slice())
            .unwrap_or(&[])
    }

    /// State this one was derived from
    pub fn previous(&self) -> Option<StateId> {
        self.session.states.get(self.id).and_then(|s| s.previous)
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn document(&self) -> Result<&Document> {
        self.session.get_document(self.document)
    }

    pub(crate) fn document_mut(&mut self) -> Result<&mut Document> {
        self.session.document_mut(self.document)
    }

    /// Element nodes of the stack
    pub(crate) fn elements(&self) -> Result<Vec<NodeId>> {
        let tree = &self.document()?.tree;
        Ok(self.nodes.iter().copied().filter(|&n| tree.is_element(n)).collect())
    }

    /// Element nodes plus the document node
    fn containers(&self) -> Result<Vec<NodeId>> {
        let tree = &self.document()?.tree;
        Ok(self
            .nodes
            .iter()
            .copied()
            .filter(|&n| n == NodeId::ROOT || tree.is_element(n))
            .collect())
    }

    /// Record `nodes` as a new state derived from this one
    pub(crate) fn derive(self, nodes: Vec<NodeId>) -> Selection<'s> {
        let Selection {
            session,
            id: previous,
            document,
            nodes: backup,
        } = self;
        let id = session.states.push(QueryState {
            document,
            nodes: nodes.clone(),
            backup,
            previous: Some(previous),
        });
        Selection::new(session, id, document, nodes)
    }

    /// Handle on the state this one was derived from, or on itself
    pub fn end(self) -> Selection<'s> {
        let Some((previous, document, nodes)) = self
            .previous()
            .and_then(|p| self.session.states.get(p).map(|s| (p, s.document, s.nodes.clone())))
        else {
            return self;
        };
        Selection::new(self.session, previous, document, nodes)
    }

    // ---- query ----

    /// Descendants matching `selector`, duplicates removed
    pub fn find(mut self, selector: &str) -> Result<Selection<'s>> {
        let selector = Selector::parse(selector)?;
        let nodes = self.nodes.clone();
        let found = selector::find(self.document_mut()?, &nodes, &selector)?;
        Ok(self.derive(found))
    }

    /// Nodes of the stack matching `selector`
    ///
    /// Alternatives are concatenated without removing duplicates.
    pub fn filter(mut self, selector: &str) -> Result<Selection<'s>> {
        let selector = Selector::parse(selector)?;
        let nodes = self.nodes.clone();
        let kept = selector::filter(self.document_mut()?, &nodes, &selector)?;
        Ok(self.derive(kept))
    }

    /// Nodes of the stack not matching `selector`
    pub fn not(mut self, selector: &str) -> Result<Selection<'s>> {
        let selector = Selector::parse(selector)?;
        let nodes = self.nodes.clone();
        let matched: HashSet<NodeId> = selector::filter(self.document_mut()?, &nodes, &selector)?
            .into_iter()
            .collect();
        let kept = nodes.into_iter().filter(|n| !matched.contains(n)).collect();
        Ok(self.derive(kept))
    }

    /// Whether any node of the stack matches `selector`
    pub fn is(&mut self, selector: &str) -> Result<bool> {
        let selector = Selector::parse(selector)?;
        let nodes = self.nodes.clone();
        selector::is(self.document_mut()?, &nodes, &selector)
    }

    /// Merge the document-wide matches of `selector` into the stack
    pub fn add(self, selector: &str) -> Result<Selection<'s>> {
        if selector.trim().is_empty() {
            return Ok(self);
        }
        let found = self.session.find_in_document(self.document, selector)?;
        let mut nodes = self.nodes.clone();
        merge(&mut nodes, found);
        Ok(self.derive(nodes))
    }

    // ---- traversal ----

    /// Element children, optionally filtered
    pub fn children(mut self, selector: Option<&str>) -> Result<Selection<'s>> {
        let containers = self.containers()?;
        let tree = &self.document()?.tree;
        let mut children = Vec::new();
        for node in containers {
            merge(&mut children, tree.element_children(node));
        }
        let children = self.refine(children, selector)?;
        Ok(self.derive(children))
    }

    /// Child nodes of every kind
    pub fn contents(self) -> Result<Selection<'s>> {
        let containers = self.containers()?;
        let tree = &self.document()?.tree;
        let contents = containers.into_iter().flat_map(|n| tree.children(n)).collect();
        Ok(self.derive(contents))
    }

    /// Distinct parents, optionally filtered
    pub fn parent(mut self, selector: Option<&str>) -> Result<Selection<'s>> {
        let tree = &self.document()?.tree;
        let mut parents = Vec::new();
        merge(&mut parents, self.nodes.iter().filter_map(|&n| tree.parent(n)));
        let parents = self.refine(parents, selector)?;
        Ok(self.derive(parents))
    }

    /// Element ancestors, nearest first, optionally filtered
    pub fn parents(mut self, selector: Option<&str>) -> Result<Selection<'s>> {
        let tree = &self.document()?.tree;
        let mut ancestors = Vec::new();
        for &node in &self.nodes {
            let mut current = tree.parent(node);
            let mut chain = Vec::new();
            while let Some(parent) = current.filter(|&p| tree.is_element(p)) {
                chain.push(parent);
                current = tree.parent(parent);
            }
            merge(&mut ancestors, chain);
        }
        let ancestors = self.refine(ancestors, selector)?;
        Ok(self.derive(ancestors))
    }

    /// Element siblings on both sides, optionally filtered
    pub fn siblings(mut self, selector: Option<&str>) -> Result<Selection<'s>> {
        let before = self.walk_siblings(Direction::Previous, false)?;
        let after = self.walk_siblings(Direction::Next, false)?;
        let mut siblings = self.refine(before, selector)?;
        let after = self.refine(after, selector)?;
        merge(&mut siblings, after);
        Ok(self.derive(siblings))
    }

    /// Next element sibling of each node
    pub fn next(mut self, selector: Option<&str>) -> Result<Selection<'s>> {
        let found = self.walk_siblings(Direction::Next, true)?;
        let found = self.refine(found, selector)?;
        Ok(self.derive(found))
    }

    /// Previous element sibling of each node
    pub fn prev(mut self, selector: Option<&str>) -> Result<Selection<'s>> {
        let found = self.walk_siblings(Direction::Previous, true)?;
        let found = self.refine(found, selector)?;
        Ok(self.derive(found))
    }

    /// All following element siblings
    pub fn next_all(mut self, selector: Option<&str>) -> Result<Selection<'s>> {
        let found = self.walk_siblings(Direction::Next, false)?;
        let found = self.refine(found, selector)?;
        Ok(self.derive(found))
    }

    /// All preceding element siblings, nearest first
    pub fn prev_all(mut self, selector: Option<&str>) -> Result<Selection<'s>> {
        let found = self.walk_siblings(Direction::Previous, false)?;
        let found = self.refine(found, selector)?;
        Ok(self.derive(found))
    }

    /// The node at `index`, or nothing
    pub fn eq(self, index: usize) -> Selection<'s> {
        let nodes = self.get(index).into_iter().collect();
        self.derive(nodes)
    }

    /// `start..end` with array-slice rules; see [`crate::selector::PseudoClass::Slice`]
    pub fn slice(self, start: i64, end: Option<i64>) -> Selection<'s> {
        let nodes = self.nodes[slice_bounds(self.nodes.len(), start, end)].to_vec();
        self.derive(nodes)
    }

    pub fn reverse(self) -> Selection<'s> {
        let nodes = self.nodes.iter().rev().copied().collect();
        self.derive(nodes)
    }

    /// Position of `node` in the stack (last occurrence)
    pub fn index(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().rposition(|&n| n == node)
    }

    /// Position of the first node of another result set
    pub fn index_of(&self, other: StateId) -> Option<usize> {
        let first = self.session.states.get(other)?.nodes.first().copied()?;
        self.index(first)
    }

    /// Visit every node
    pub fn each(self, mut visit: impl FnMut(usize, NodeRef)) -> Selection<'s> {
        for (i, &node) in self.nodes.iter().enumerate() {
            visit(i, NodeRef::new(self.document, node));
        }
        self
    }

    // ---- helpers ----

    fn walk_siblings(&self, direction: Direction, first_only: bool) -> Result<Vec<NodeId>> {
        let tree = &self.document()?.tree;
        let step = |n: NodeId| match direction {
            Direction::Next => tree.next_element_sibling(n),
            Direction::Previous => tree.prev_element_sibling(n),
        };
        let mut found = Vec::new();
        for &node in &self.nodes {
            let mut current = step(node);
            while let Some(sibling) = current {
                found.push(sibling);
                if first_only {
                    break;
                }
                current = step(sibling);
            }
        }
        Ok(found)
    }

    /// Filter a traversal result by an optional selector, dropping repeats
    fn refine(&mut self, nodes: Vec<NodeId>, selector: Option<&str>) -> Result<Vec<NodeId>> {
        let nodes = match selector {
            Some(text) if !text.trim().is_empty() => {
                let selector = Selector::parse(text)?;
                selector::filter(self.document_mut()?, &nodes, &selector)?
            }
            _ => nodes,
        };
        let mut unique = Vec::with_capacity(nodes.len());
        merge(&mut unique, nodes);
        Ok(unique)
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Next,
    Previous,
}

/// Append nodes not yet present
fn merge(into: &mut Vec<NodeId>, nodes: impl IntoIterator<Item = NodeId>) {
    let mut seen: HashSet<NodeId> = into.iter().copied().collect();
    for node in nodes {
        if seen.insert(node) {
            into.push(node);
        }
    }
}

impl fmt::Display for Selection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let markup = self.outer_markup().map_err(|_| fmt::Error)?;
        f.write_str(&markup)
    }
}

impl fmt::Debug for Selection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("id", &self.id)
            .field("document", &self.document)
            .field("nodes", &self.nodes)
            .finish()
    }
}
