//! fOS DOM - Document Object Model
//!
//! Arena-backed DOM tree used by the query engine.
//!
//! Besides the raw tree primitives this crate carries the document
//! registry, absolute node paths and the path-query evaluator that the
//! selector compiler targets.

mod node;
mod tree;
mod document;
mod registry;
mod path;
mod attach;
mod operations;

pub use node::{Attribute, ElementData, Node, NodeData, NodeType, QualName};
pub use tree::{Children, Descendants, DomTree, Fragment};
pub use document::{Document, DocumentKind};
pub use registry::{DocumentId, DocumentRegistry};
pub use path::{Axis, NameTest, NodePath, PathCache, PathExpr, PathStep, Predicate, Step};
pub use attach::TemporaryAttach;
pub use operations::{DomError, DomResult};

/// HTML namespace URI
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID (the document node)
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this ID points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Convert a sentinel-encoded link into an `Option`
    #[inline]
    pub(crate) fn some(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
