//! DOM Tree (arena-based allocation)
//!
//! All nodes of a document live in one `Vec<Node>`. Detached nodes stay in
//! the arena; they simply have no path back to `NodeId::ROOT`.

use crate::{Attribute, DomError, DomResult, ElementData, Node, NodeData, NodeId, QualName};

/// Arena-based DOM tree for memory efficiency
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
        }
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check that `id` names a node of this tree
    pub fn contains_id(&self, id: NodeId) -> bool {
        id.is_valid() && id.index() < self.nodes.len()
    }

    // ---- creation ----

    /// Allocate a detached node
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn create_element(&mut self, name: QualName) -> NodeId {
        self.alloc(Node::element(name))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::text(text))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text.into())))
    }

    // ---- navigation ----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.some())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.some())
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.last_child.some())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.some())
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling.some())
    }

    /// Iterate direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Iterate direct element children
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(move |&c| self.is_element(c))
    }

    /// Next sibling that is an element
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(id);
        while let Some(node) = current {
            if self.is_element(node) {
                return Some(node);
            }
            current = self.next_sibling(node);
        }
        None
    }

    /// Previous sibling that is an element
    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.prev_sibling(id);
        while let Some(node) = current {
            if self.is_element(node) {
                return Some(node);
            }
            current = self.prev_sibling(node);
        }
        None
    }

    /// Preorder iteration over the subtree below `id` (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: self.first_child(id),
        }
    }

    // ---- element data ----

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(Node::as_element_mut)
    }

    /// Serialized tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        self.element(id).map(|e| e.name.tag_name())
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.get_attr(name))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_attr(name))
    }

    /// Set an attribute; a no-op on non-elements
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(elem) = self.element_mut(id) {
            elem.set_attr(name, value);
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        self.element_mut(id).is_some_and(|e| e.remove_attr(name))
    }

    /// Attributes in source order (empty for non-elements)
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.element(id).map(|e| e.attrs.as_slice()).unwrap_or(&[])
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(t)) | Some(NodeData::Comment(t)) => t.clone(),
            Some(NodeData::ProcessingInstruction { data, .. }) => data.clone(),
            _ => self
                .descendants(id)
                .filter_map(|d| self.get(d).and_then(Node::as_text))
                .collect(),
        }
    }

    // ---- ancestry ----

    /// Strict ancestor test
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Inclusive ancestor test
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.is_ancestor(ancestor, node)
    }

    /// Highest ancestor of `id` (itself when detached without parent)
    pub fn top_ancestor(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(p) = self.parent(current) {
            current = p;
        }
        current
    }

    /// Reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains_id(id) && self.top_ancestor(id) == NodeId::ROOT
    }

    // ---- mutation ----

    /// Unlink a node from its parent and siblings
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        if let Some(p) = self.get_mut(prev) {
            p.next_sibling = next;
        } else if let Some(parent_node) = self.get_mut(parent) {
            parent_node.first_child = next;
        }

        if let Some(n) = self.get_mut(next) {
            n.prev_sibling = prev;
        } else if let Some(parent_node) = self.get_mut(parent) {
            parent_node.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let (Some(parent_node), Some(child_node)) = (self.get(parent), self.get(child)) else {
            return Err(DomError::NotFound);
        };
        if !matches!(parent_node.data, NodeData::Element(_) | NodeData::Document) {
            return Err(DomError::InvalidNodeType);
        }
        if matches!(child_node.data, NodeData::Document) {
            return Err(DomError::HierarchyRequest);
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    /// Append `child` as last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.check_insertion(parent, child)?;
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild);
            }
            if reference == child {
                return Ok(child);
            }
        }

        self.detach(child);

        let (prev, next) = match reference {
            Some(r) => (self.prev_sibling(r).unwrap_or(NodeId::NONE), r),
            None => (self.last_child(parent).unwrap_or(NodeId::NONE), NodeId::NONE),
        };

        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        if let Some(p) = self.get_mut(prev) {
            p.next_sibling = child;
        } else if let Some(parent_node) = self.get_mut(parent) {
            parent_node.first_child = child;
        }
        if let Some(n) = self.get_mut(next) {
            n.prev_sibling = child;
        } else if let Some(parent_node) = self.get_mut(parent) {
            parent_node.last_child = child;
        }
        Ok(child)
    }

    /// Remove a direct child
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.detach(child);
        Ok(child)
    }

    /// Detach every child of `id`
    pub fn remove_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
    }

    // ---- copying ----

    /// Owned copy of the subtree rooted at `id`
    pub fn export(&self, id: NodeId) -> Option<Fragment> {
        let node = self.get(id)?;
        Some(Fragment {
            data: node.data.clone(),
            children: self
                .children(id)
                .filter_map(|c| self.export(c))
                .collect(),
        })
    }

    /// Materialize a fragment as a detached subtree; returns its root
    pub fn import(&mut self, fragment: &Fragment) -> DomResult<NodeId> {
        let id = self.alloc(Node::new(fragment.data.clone()));
        for child in &fragment.children {
            let child_id = self.import(child)?;
            self.append_child(id, child_id)?;
        }
        Ok(id)
    }

    /// Detached deep copy of a node within the same tree
    pub fn deep_clone(&mut self, id: NodeId) -> DomResult<NodeId> {
        let fragment = self.export(id).ok_or(DomError::NotFound)?;
        self.import(&fragment)
    }
}

/// Owned, tree-independent copy of a subtree
///
/// Used to move content between documents: export from one tree, import
/// into another.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub data: NodeData,
    pub children: Vec<Fragment>,
}

impl Fragment {
    /// Element fragment without children
    pub fn element(name: QualName) -> Self {
        Self {
            data: NodeData::Element(ElementData::new(name)),
            children: Vec::new(),
        }
    }

    /// Text fragment
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            data: NodeData::Text(text.into()),
            children: Vec::new(),
        }
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

/// Preorder iterator bounded to one subtree
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.first_child(current).or_else(|| {
            let mut node = current;
            loop {
                if node == self.root {
                    return None;
                }
                if let Some(sibling) = self.tree.next_sibling(node) {
                    return Some(sibling);
                }
                node = self.tree.parent(node)?;
            }
        });
        Some(current)
    }
}
