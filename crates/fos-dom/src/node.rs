//! DOM Node - Arena representation
//!
//! Nodes refer to each other through `NodeId` links instead of pointers.
//! Unset links hold `NodeId::NONE`.

use crate::{NodeId, HTML_NAMESPACE};

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (NONE if detached or document)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    /// Create an unlinked node around `data`
    pub fn new(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(name: QualName) -> Self {
        Self::new(NodeData::Element(ElementData::new(name)))
    }

    /// Create a new text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeData::Text(content.into()))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::new(NodeData::Document)
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// DOM node type
    pub fn node_type(&self) -> NodeType {
        match &self.data {
            NodeData::Document => NodeType::Document,
            NodeData::Doctype { .. } => NodeType::DocumentType,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
            NodeData::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }
}

/// Node-specific data
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Document root
    Document,
    /// DOCTYPE
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
    /// Processing instruction
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

/// Node type, numbered like the DOM `nodeType` constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Element,
    Text,
    ProcessingInstruction,
    Comment,
    Document,
    DocumentType,
}

impl NodeType {
    /// Numeric `nodeType` code
    pub fn code(self) -> u16 {
        match self {
            NodeType::Element => 1,
            NodeType::Text => 3,
            NodeType::ProcessingInstruction => 7,
            NodeType::Comment => 8,
            NodeType::Document => 9,
            NodeType::DocumentType => 10,
        }
    }
}

/// Qualified element or attribute name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualName {
    pub prefix: Option<String>,
    pub ns: String,
    pub local: String,
}

impl QualName {
    pub fn new(prefix: Option<String>, ns: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix,
            ns: ns.into(),
            local: local.into(),
        }
    }

    /// Name in the HTML namespace
    pub fn html(local: impl Into<String>) -> Self {
        Self::new(None, HTML_NAMESPACE, local)
    }

    /// Name without namespace (attributes, plain XML)
    pub fn plain(local: impl Into<String>) -> Self {
        Self::new(None, "", local)
    }

    /// Parse `prefix:local` into a namespace-less qualified name
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => {
                Self::new(Some(prefix.to_string()), "", local)
            }
            _ => Self::plain(name),
        }
    }

    /// Serialized name (`prefix:local` or `local`)
    pub fn tag_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }

    /// Compare against a serialized name without allocating
    pub fn matches(&self, name: &str) -> bool {
        match &self.prefix {
            Some(prefix) => name
                .split_once(':')
                .is_some_and(|(p, l)| p == prefix && l == self.local),
            None => self.local == name,
        }
    }
}

/// Element-specific data
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name (qualified)
    pub name: QualName,
    /// Attributes in source order
    pub attrs: Vec<Attribute>,
}

impl ElementData {
    pub fn new(name: QualName) -> Self {
        Self {
            name,
            attrs: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.matches(name))
            .map(|a| a.value.as_str())
    }

    /// Check if an attribute exists
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.matches(name))
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name.matches(name)) {
            attr.value = value;
            return;
        }
        self.attrs.push(Attribute {
            name: QualName::parse(name),
            value,
        });
    }

    /// Remove an attribute, returning whether it existed
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|a| !a.name.matches(name));
        self.attrs.len() != before
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualname_matches() {
        let name = QualName::new(Some("svg".into()), "", "rect");
        assert!(name.matches("svg:rect"));
        assert!(!name.matches("rect"));
        assert_eq!(name.tag_name(), "svg:rect");

        let plain = QualName::html("div");
        assert!(plain.matches("div"));
        assert!(!plain.matches("x:div"));
    }

    #[test]
    fn test_element_attributes() {
        let mut elem = ElementData::new(QualName::html("a"));
        elem.set_attr("href", "/one");
        elem.set_attr("title", "t");
        elem.set_attr("href", "/two");

        assert_eq!(elem.get_attr("href"), Some("/two"));
        assert_eq!(elem.attrs[0].name.local, "href");
        assert!(elem.remove_attr("title"));
        assert!(!elem.has_attr("title"));
        assert!(!elem.remove_attr("title"));
    }

    #[test]
    fn test_node_type_codes() {
        assert_eq!(Node::document().node_type().code(), 9);
        assert_eq!(Node::text("x").node_type().code(), 3);
        assert_eq!(Node::element(QualName::html("p")).node_type().code(), 1);
    }
}
