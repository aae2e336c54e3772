//! Scoped temporary attachment
//!
//! Path queries only work on connected nodes. The guard hangs the
//! top-most ancestor of a detached node under the document node and
//! detaches it again when dropped, on every exit path.

use std::ops::Deref;

use crate::{Document, DomResult, NodeId};

/// Keeps a detached subtree attached for the guard's lifetime
pub struct TemporaryAttach<'a> {
    document: &'a mut Document,
    attached: Option<NodeId>,
}

impl<'a> TemporaryAttach<'a> {
    /// Make `node` reachable from the document node
    pub fn new(document: &'a mut Document, node: NodeId) -> DomResult<Self> {
        let top = document.tree.top_ancestor(node);
        let attached = if top == NodeId::ROOT {
            None
        } else {
            document.tree.append_child(NodeId::ROOT, top)?;
            tracing::trace!(node = %top, "temporarily attached subtree");
            Some(top)
        };
        Ok(Self { document, attached })
    }

    /// Whether the guard had to attach anything
    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }
}

impl Deref for TemporaryAttach<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        self.document
    }
}

impl Drop for TemporaryAttach<'_> {
    fn drop(&mut self) {
        if let Some(top) = self.attached.take() {
            self.document.tree.detach(top);
            tracing::trace!(node = %top, "detached temporary subtree");
        }
    }
}
