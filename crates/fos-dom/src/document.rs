//! Document - High-level document API

use crate::{DomTree, NodeId, QualName, HTML_NAMESPACE};

/// Markup flavor of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocumentKind {
    #[default]
    Html,
    Xhtml,
    Xml,
}

/// Loaded document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Markup flavor
    pub kind: DocumentKind,
    /// Declared or assumed character set
    pub charset: String,
    /// Content type the document was loaded as
    pub content_type: String,
}

impl Document {
    /// Create an empty document (document node only)
    pub fn new(kind: DocumentKind, charset: &str) -> Self {
        let content_type = match kind {
            DocumentKind::Html => "text/html",
            DocumentKind::Xhtml => "application/xhtml+xml",
            DocumentKind::Xml => "text/xml",
        };
        Self {
            tree: DomTree::new(),
            kind,
            charset: charset.to_string(),
            content_type: content_type.to_string(),
        }
    }

    /// Wrap an already built tree
    pub fn from_tree(tree: DomTree, kind: DocumentKind, charset: &str) -> Self {
        Self {
            tree,
            ..Self::new(kind, charset)
        }
    }

    /// XML-family document (XML or XHTML)
    pub fn is_xml(&self) -> bool {
        matches!(self.kind, DocumentKind::Xml | DocumentKind::Xhtml)
    }

    pub fn is_html(&self) -> bool {
        self.kind == DocumentKind::Html
    }

    pub fn is_xhtml(&self) -> bool {
        self.kind == DocumentKind::Xhtml
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// First element child of the document node
    pub fn document_element(&self) -> Option<NodeId> {
        self.tree.element_children(NodeId::ROOT).next()
    }

    /// First connected element carrying `id`
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(NodeId::ROOT)
            .find(|&n| self.tree.get_attribute(n, "id") == Some(id))
    }

    /// Create a detached element in the namespace matching the document kind
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let qual = match (self.kind, QualName::parse(name)) {
            (DocumentKind::Html, QualName { prefix: None, local, .. }) => {
                QualName::new(None, HTML_NAMESPACE, local)
            }
            (_, parsed) => parsed,
        };
        self.tree.create_element(qual)
    }

    /// Compare an element's tag with a selector name using document rules
    ///
    /// HTML compares ASCII case-insensitively; XML compares the qualified
    /// name exactly, and an un-prefixed name also matches the local name.
    pub fn tag_matches(&self, id: NodeId, name: &str) -> bool {
        let Some(elem) = self.tree.element(id) else {
            return false;
        };
        if self.is_html() {
            return elem.name.tag_name().eq_ignore_ascii_case(name);
        }
        elem.name.matches(name) || (!name.contains(':') && elem.name.local == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_element_and_lookup() {
        let mut doc = Document::new(DocumentKind::Html, "UTF-8");
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        doc.tree.append_child(NodeId::ROOT, html).unwrap();
        doc.tree.append_child(html, body).unwrap();
        doc.tree.set_attribute(body, "id", "main");

        assert_eq!(doc.document_element(), Some(html));
        assert_eq!(doc.get_element_by_id("main"), Some(body));
        assert_eq!(doc.tree.element(html).unwrap().name.ns, HTML_NAMESPACE);
    }

    #[test]
    fn test_tag_matching_rules() {
        let mut html = Document::new(DocumentKind::Html, "UTF-8");
        let div = html.create_element("div");
        assert!(html.tag_matches(div, "DIV"));

        let mut xml = Document::new(DocumentKind::Xml, "UTF-8");
        let item = xml.create_element("ns:item");
        assert!(xml.tag_matches(item, "ns:item"));
        assert!(xml.tag_matches(item, "item"));
        assert!(!xml.tag_matches(item, "ITEM"));
        assert!(xml.is_xml());
    }
}
