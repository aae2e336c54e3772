//! Snapshot iteration and indexed access

use fos_dom::{DocumentId, NodeId};

use crate::error::{QueryError, Result};
use crate::selector::{self, Selector};
use crate::session::NodeRef;
use crate::Selection;

/// Cursor over the nodes a selection held when the cursor was made
///
/// Later changes to the tree or to other states do not affect which nodes
/// it visits.
#[derive(Debug, Clone)]
pub struct SelectionIter {
    document: DocumentId,
    nodes: Vec<NodeId>,
    position: usize,
}

impl SelectionIter {
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn valid(&self) -> bool {
        self.position < self.nodes.len()
    }

    pub fn key(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> Option<NodeRef> {
        self.nodes
            .get(self.position)
            .map(|&node| NodeRef::new(self.document, node))
    }

    pub fn advance(&mut self) {
        if self.valid() {
            self.position += 1;
        }
    }
}

impl Iterator for SelectionIter {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let current = self.current()?;
        self.position += 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.nodes.len().saturating_sub(self.position);
        (left, Some(left))
    }
}

impl ExactSizeIterator for SelectionIter {}

impl<'s> Selection<'s> {
    pub fn iter(&self) -> SelectionIter {
        SelectionIter {
            document: self.document_id(),
            nodes: self.nodes().to_vec(),
            position: 0,
        }
    }

    /// Whether `selector` finds anything below the nodes
    pub fn contains_match(&mut self, selector: &str) -> Result<bool> {
        let selector = Selector::parse(selector)?;
        let nodes = self.nodes().to_vec();
        Ok(!selector::find(self.document_mut()?, &nodes, &selector)?.is_empty())
    }

    /// Indexed read: same as [`Selection::find`]
    pub fn at(self, selector: &str) -> Result<Selection<'s>> {
        self.find(selector)
    }

    /// Indexed write: replace the content of every match of `selector`
    pub fn replace_at(self, selector: &str, markup: &str) -> Result<Selection<'s>> {
        self.find(selector)?.set_inner_markup(markup)
    }

    /// Indexed delete is not supported
    pub fn remove_at(&self, selector: &str) -> Result<()> {
        Err(QueryError::Unsupported(format!("cannot delete '{selector}' by index")))
    }
}
