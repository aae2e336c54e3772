//! Document registry
//!
//! Owns every loaded document and hands out stable identifiers.

use std::collections::HashMap;
use std::fmt;

use crate::Document;

/// Stable document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u32);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// Registry of loaded documents
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: HashMap<DocumentId, Document>,
    next_id: u32,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document and return its identifier
    pub fn insert(&mut self, document: Document) -> DocumentId {
        let id = DocumentId(self.next_id);
        self.next_id += 1;
        self.documents.insert(id, document);
        tracing::debug!(document = %id, "registered document");
        id
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(&id)
    }

    /// Unload a document
    pub fn remove(&mut self, id: DocumentId) -> Option<Document> {
        let removed = self.documents.remove(&id);
        if removed.is_some() {
            tracing::debug!(document = %id, "unloaded document");
        }
        removed
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.documents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Loaded identifiers in creation order
    pub fn ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<_> = self.documents.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Most recently registered document still loaded
    pub fn last(&self) -> Option<DocumentId> {
        self.documents.keys().copied().max()
    }
}
