//! Session: documents, query history and style tables
//!
//! A session owns every loaded document. Result sets live in its state
//! arena and are addressed through [`Selection`] handles; documents stay
//! loaded until [`Session::remove_document`] is called.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use fos_css::StyleTable;
use fos_dom::{Document, DocumentId, DocumentRegistry, NodeId};
use fos_html::{import_markup, parse_with_charset, ContentType, ParseError};

use crate::error::{QueryError, Result};
use crate::selector::{find, Selector};
use crate::state::{StateArena, StateId};
use crate::{Config, Selection};

/// A node together with the document that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub document: DocumentId,
    pub node: NodeId,
}

impl NodeRef {
    pub fn new(document: DocumentId, node: NodeId) -> Self {
        Self { document, node }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.document, self.node)
    }
}

/// Query session
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) config: Config,
    pub(crate) documents: DocumentRegistry,
    pub(crate) styles: HashMap<DocumentId, StyleTable>,
    pub(crate) states: StateArena,
}

impl Session {
    /// Create a session with no documents
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn documents(&self) -> &DocumentRegistry {
        &self.documents
    }

    /// Number of query states recorded so far
    pub fn history_len(&self) -> usize {
        self.states.len()
    }

    // ---- loading ----

    /// Parse `markup` and register the document
    ///
    /// `content_type` defaults to the configured one; a charset missing
    /// from it is detected from the markup or taken from the config.
    pub fn new_document(&mut self, markup: &str, content_type: Option<&str>) -> Result<DocumentId> {
        let content_type = ContentType::parse(content_type.unwrap_or(&self.config.default_content_type))?;
        let document = parse_with_charset(markup, &content_type, &self.config.default_charset)?;
        Ok(self.documents.insert(document))
    }

    pub fn new_document_html(&mut self, markup: &str, charset: Option<&str>) -> Result<DocumentId> {
        self.load_as(markup, ContentType::html(), charset)
    }

    pub fn new_document_xml(&mut self, markup: &str, charset: Option<&str>) -> Result<DocumentId> {
        self.load_as(markup, ContentType::xml(), charset)
    }

    pub fn new_document_xhtml(&mut self, markup: &str, charset: Option<&str>) -> Result<DocumentId> {
        self.load_as(markup, ContentType::xhtml(), charset)
    }

    /// Read a file and load it like [`Session::new_document`]
    pub fn new_document_file(&mut self, path: impl AsRef<Path>, content_type: Option<&str>) -> Result<DocumentId> {
        let markup = read_file(path.as_ref())?;
        self.new_document(&markup, content_type)
    }

    pub fn new_document_file_html(&mut self, path: impl AsRef<Path>, charset: Option<&str>) -> Result<DocumentId> {
        let markup = read_file(path.as_ref())?;
        self.new_document_html(&markup, charset)
    }

    pub fn new_document_file_xml(&mut self, path: impl AsRef<Path>, charset: Option<&str>) -> Result<DocumentId> {
        let markup = read_file(path.as_ref())?;
        self.new_document_xml(&markup, charset)
    }

    pub fn new_document_file_xhtml(&mut self, path: impl AsRef<Path>, charset: Option<&str>) -> Result<DocumentId> {
        let markup = read_file(path.as_ref())?;
        self.new_document_xhtml(&markup, charset)
    }

    fn load_as(&mut self, markup: &str, content_type: ContentType, charset: Option<&str>) -> Result<DocumentId> {
        let content_type = match charset {
            Some(charset) => content_type.with_charset(charset),
            None => content_type,
        };
        let document = parse_with_charset(markup, &content_type, &self.config.default_charset)?;
        Ok(self.documents.insert(document))
    }

    /// Unload a document; its nodes can no longer be queried
    pub fn remove_document(&mut self, id: DocumentId) -> Result<Document> {
        self.styles.remove(&id);
        self.documents
            .remove(id)
            .ok_or(QueryError::DocumentNotLoaded(id))
    }

    pub fn get_document(&self, id: DocumentId) -> Result<&Document> {
        self.documents.get(id).ok_or(QueryError::DocumentNotLoaded(id))
    }

    pub(crate) fn document_mut(&mut self, id: DocumentId) -> Result<&mut Document> {
        self.documents.get_mut(id).ok_or(QueryError::DocumentNotLoaded(id))
    }

    // ---- selections ----

    /// Selection holding the document node
    pub fn document(&mut self, id: DocumentId) -> Result<Selection<'_>> {
        self.get_document(id)?;
        let state = self.states.push_root(id, vec![NodeId::ROOT]);
        Ok(self.open(state, id, vec![NodeId::ROOT]))
    }

    /// `document(id)` followed by `find(selector)`
    pub fn query(&mut self, id: DocumentId, selector: &str) -> Result<Selection<'_>> {
        self.document(id)?.find(selector)
    }

    /// Parse `markup` into detached nodes of document `id`
    pub fn import(&mut self, id: DocumentId, markup: &str) -> Result<Selection<'_>> {
        let nodes = import_markup(self.document_mut(id)?, markup)?;
        let state = self.states.push_root(id, nodes.clone());
        Ok(self.open(state, id, nodes))
    }

    /// Selection over a single node
    pub fn wrap(&mut self, node: NodeRef) -> Result<Selection<'_>> {
        self.wrap_nodes(node.document, &[node.node])
    }

    /// Selection over nodes of one document
    pub fn wrap_nodes(&mut self, document: DocumentId, nodes: &[NodeId]) -> Result<Selection<'_>> {
        for &node in nodes {
            self.document_of(NodeRef::new(document, node))?;
        }
        let state = self.states.push_root(document, nodes.to_vec());
        Ok(self.open(state, document, nodes.to_vec()))
    }

    /// Owning document of a node reference
    pub fn document_of(&self, node: NodeRef) -> Result<DocumentId> {
        match self.documents.get(node.document) {
            Some(document) if document.tree.contains_id(node.node) => Ok(node.document),
            _ => Err(QueryError::OrphanedNode),
        }
    }

    /// Reacquire a handle on a recorded state
    pub fn selection(&mut self, id: StateId) -> Option<Selection<'_>> {
        let state = self.states.get(id)?;
        let (document, nodes) = (state.document, state.nodes.clone());
        Some(self.open(id, document, nodes))
    }

    fn open(&mut self, state: StateId, document: DocumentId, nodes: Vec<NodeId>) -> Selection<'_> {
        Selection::new(self, state, document, nodes)
    }

    /// Resolve a selector against a whole document
    pub(crate) fn find_in_document(&mut self, id: DocumentId, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        find(self.document_mut(id)?, &[NodeId::ROOT], &selector)
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| QueryError::Html(ParseError::Io(err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lifecycle() {
        let mut session = Session::default();
        let id = session.new_document("<p>hi</p>", None).unwrap();
        assert!(session.get_document(id).unwrap().is_html());
        assert_eq!(session.document(id).unwrap().nodes(), &[NodeId::ROOT]);

        session.remove_document(id).unwrap();
        assert!(matches!(session.document(id), Err(QueryError::DocumentNotLoaded(_))));
        assert!(matches!(session.remove_document(id), Err(QueryError::DocumentNotLoaded(_))));
    }

    #[test]
    fn test_kinds_and_charsets() {
        let mut session = Session::default();
        let xml = session.new_document_xml("<root/>", None).unwrap();
        let xhtml = session.new_document_xhtml("<html/>", Some("ISO-8859-1")).unwrap();
        let html = session
            .new_document("<p/>", Some("text/html; charset=windows-1252"))
            .unwrap();

        assert!(session.get_document(xml).unwrap().is_xml());
        assert!(session.get_document(xhtml).unwrap().is_xhtml());
        assert_eq!(session.get_document(xhtml).unwrap().charset, "ISO-8859-1");
        assert_eq!(session.get_document(html).unwrap().charset, "windows-1252");
    }

    #[test]
    fn test_wrap_validates_references() {
        let mut session = Session::default();
        let id = session.new_document("<p>hi</p>", None).unwrap();
        let p = session.query(id, "p").unwrap().nodes()[0];

        assert_eq!(session.wrap(NodeRef::new(id, p)).unwrap().len(), 1);
        let bogus = NodeRef::new(DocumentId(99), p);
        assert!(matches!(session.wrap(bogus), Err(QueryError::OrphanedNode)));
        assert!(matches!(session.document_of(bogus), Err(QueryError::OrphanedNode)));
    }

    #[test]
    fn test_missing_file() {
        let mut session = Session::default();
        let err = session.new_document_file("/nonexistent/page.html", None).unwrap_err();
        assert!(matches!(err, QueryError::Html(ParseError::Io(_))));
    }
}
