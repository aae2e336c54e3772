//! Insertion, removal and replacement
//!
//! The eight insertion verbs share one routine. A verb fixes which side
//! receives the nodes (the selection itself, or the argument for the `*_to`
//! and `insert_*` forms) and where they land relative to each receiver.
//! The first receiver gets the original nodes; every further receiver gets
//! its own deep copy. Batches are not rolled back: a receiver that fails
//! leaves earlier receivers mutated.

use fos_dom::{DocumentId, DomTree, Fragment, NodeId};
use fos_html::{import_markup, is_markup};

use crate::error::{QueryError, Result};
use crate::selector::{self, Selector};
use crate::session::{NodeRef, Session};
use crate::state::StateId;
use crate::Selection;

/// Argument of an insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Markup to import; for `*_to`/`insert_*` targets, non-markup text is a selector
    Text(String),
    /// Nodes of a recorded result set
    Selection(StateId),
    Node(NodeRef),
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<StateId> for Content {
    fn from(id: StateId) -> Self {
        Self::Selection(id)
    }
}

impl From<NodeRef> for Content {
    fn from(node: NodeRef) -> Self {
        Self::Node(node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Append,
    Prepend,
    Before,
    After,
    AppendTo,
    PrependTo,
    InsertBefore,
    InsertAfter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    LastChild,
    FirstChild,
    Before,
    After,
}

impl Verb {
    /// The argument receives the selection's nodes
    fn is_inverted(self) -> bool {
        matches!(self, Self::AppendTo | Self::PrependTo | Self::InsertBefore | Self::InsertAfter)
    }

    fn placement(self) -> Placement {
        match self {
            Self::Append | Self::AppendTo => Placement::LastChild,
            Self::Prepend | Self::PrependTo => Placement::FirstChild,
            Self::Before | Self::InsertBefore => Placement::Before,
            Self::After | Self::InsertAfter => Placement::After,
        }
    }
}

impl<'s> Selection<'s> {
    /// Insert `content` as last children of every element
    pub fn append(self, content: impl Into<Content>) -> Result<Self> {
        self.insert(Verb::Append, content.into())
    }

    /// Insert `content` as first children of every element
    pub fn prepend(self, content: impl Into<Content>) -> Result<Self> {
        self.insert(Verb::Prepend, content.into())
    }

    /// Insert `content` before every node
    pub fn before(self, content: impl Into<Content>) -> Result<Self> {
        self.insert(Verb::Before, content.into())
    }

    /// Insert `content` after every node
    pub fn after(self, content: impl Into<Content>) -> Result<Self> {
        self.insert(Verb::After, content.into())
    }

    pub fn append_to(self, target: impl Into<Content>) -> Result<Self> {
        self.insert(Verb::AppendTo, target.into())
    }

    pub fn prepend_to(self, target: impl Into<Content>) -> Result<Self> {
        self.insert(Verb::PrependTo, target.into())
    }

    pub fn insert_before(self, target: impl Into<Content>) -> Result<Self> {
        self.insert(Verb::InsertBefore, target.into())
    }

    pub fn insert_after(self, target: impl Into<Content>) -> Result<Self> {
        self.insert(Verb::InsertAfter, target.into())
    }

    fn insert(self, verb: Verb, content: Content) -> Result<Self> {
        let own = self.document_id();
        let nodes = self.nodes().to_vec();
        let (destination, targets, sources) = if verb.is_inverted() {
            let (destination, targets) = resolve_targets(self.session, own, content)?;
            let sources = transfer(self.session, own, nodes, destination)?;
            (destination, targets, sources)
        } else {
            let sources = resolve_content(self.session, own, content)?;
            (own, nodes, sources)
        };

        let tree = &mut self.session.document_mut(destination)?.tree;
        tracing::debug!(?verb, targets = targets.len(), nodes = sources.len(), "insert");
        place(tree, verb.placement(), &targets, &sources)?;
        Ok(self)
    }

    /// Detach the nodes, or only those matching `selector`
    pub fn remove(mut self, selector: Option<&str>) -> Result<Self> {
        let mut nodes = self.nodes().to_vec();
        if let Some(text) = selector.filter(|s| !s.trim().is_empty()) {
            let selector = Selector::parse(text)?;
            nodes = selector::filter(self.document_mut()?, &nodes, &selector)?;
        }
        let tree = &mut self.document_mut()?.tree;
        for node in nodes {
            tree.detach(node);
        }
        Ok(self)
    }

    /// Put `content` after every node, then detach the nodes
    pub fn replace_with(self, content: impl Into<Content>) -> Result<Self> {
        self.after(content)?.remove(None)
    }

    /// Replace every match of `selector` with copies of the nodes
    ///
    /// The selection's own nodes stay where they are.
    pub fn replace_all(mut self, selector: &str) -> Result<Self> {
        let targets = self.session.find_in_document(self.document_id(), selector)?;
        let sources = self.nodes().to_vec();
        let tree = &mut self.document_mut()?.tree;
        for target in targets {
            let parent = parent_of(tree, target)?;
            let anchor = tree.next_sibling(target);
            for &node in &sources {
                let copy = tree.deep_clone(node)?;
                tree.insert_before(parent, copy, anchor)?;
            }
            tree.detach(target);
        }
        Ok(self)
    }

    /// Detached deep copies of the nodes, as a new state
    pub fn deep_clone(mut self) -> Result<Selection<'s>> {
        let nodes = self.nodes().to_vec();
        let tree = &mut self.document_mut()?.tree;
        let copies = nodes
            .into_iter()
            .map(|n| tree.deep_clone(n))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(self.derive(copies))
    }
}

/// Nodes to insert into `destination` for a non-inverted verb
fn resolve_content(session: &mut Session, destination: DocumentId, content: Content) -> Result<Vec<NodeId>> {
    match content {
        Content::Text(markup) => Ok(import_markup(session.document_mut(destination)?, &markup)?),
        Content::Selection(id) => {
            let state = session.states.get(id).ok_or(QueryError::UnknownState(id))?;
            let (document, nodes) = (state.document, state.nodes.clone());
            transfer(session, document, nodes, destination)
        }
        Content::Node(node) => {
            let document = session.document_of(node)?;
            transfer(session, document, vec![node.node], destination)
        }
    }
}

/// Receivers of an inverted verb and the document they live in
fn resolve_targets(session: &mut Session, own: DocumentId, target: Content) -> Result<(DocumentId, Vec<NodeId>)> {
    match target {
        Content::Text(text) if is_markup(&text) => Ok((own, import_markup(session.document_mut(own)?, &text)?)),
        Content::Text(selector) => Ok((own, session.find_in_document(own, &selector)?)),
        Content::Selection(id) => {
            let state = session.states.get(id).ok_or(QueryError::UnknownState(id))?;
            Ok((state.document, state.nodes.clone()))
        }
        Content::Node(node) => Ok((session.document_of(node)?, vec![node.node])),
    }
}

/// Make `nodes` of document `from` usable in document `to`
///
/// Within one document the nodes themselves are used. Across documents
/// they are copied, leaving the source tree untouched. The document node
/// stands for its children.
fn transfer(session: &mut Session, from: DocumentId, nodes: Vec<NodeId>, to: DocumentId) -> Result<Vec<NodeId>> {
    let source = &session.get_document(from)?.tree;
    let nodes: Vec<NodeId> = nodes
        .into_iter()
        .flat_map(|n| {
            if n == NodeId::ROOT {
                source.children(n).collect()
            } else {
                vec![n]
            }
        })
        .collect();
    if from == to {
        return Ok(nodes);
    }

    let fragments: Vec<Fragment> = nodes.iter().filter_map(|&n| source.export(n)).collect();
    let tree = &mut session.document_mut(to)?.tree;
    let imported = fragments.iter().map(|f| tree.import(f)).collect::<fos_dom::DomResult<Vec<_>>>()?;
    Ok(imported)
}

fn place(tree: &mut DomTree, placement: Placement, targets: &[NodeId], sources: &[NodeId]) -> Result<()> {
    let containers = matches!(placement, Placement::LastChild | Placement::FirstChild);
    let targets: Vec<NodeId> = targets
        .iter()
        .copied()
        .filter(|&t| !containers || t == NodeId::ROOT || tree.is_element(t))
        .collect();

    for (i, target) in targets.into_iter().enumerate() {
        let (parent, anchor) = match placement {
            Placement::LastChild => (target, None),
            Placement::FirstChild => (target, tree.first_child(target)),
            Placement::Before => (parent_of(tree, target)?, Some(target)),
            Placement::After => (parent_of(tree, target)?, tree.next_sibling(target)),
        };
        // originals move on the first pass and cannot serve as the anchor
        let moving: &[NodeId] = if i == 0 { sources } else { &[] };
        let anchor = stable_anchor(tree, anchor, moving);
        for &node in sources {
            let node = if i == 0 { node } else { tree.deep_clone(node)? };
            tree.insert_before(parent, node, anchor)?;
        }
    }
    Ok(())
}

/// First sibling from `start` onwards that is not among `moving`
fn stable_anchor(tree: &DomTree, mut start: Option<NodeId>, moving: &[NodeId]) -> Option<NodeId> {
    while let Some(node) = start.filter(|n| moving.contains(n)) {
        start = tree.next_sibling(node);
    }
    start
}

fn parent_of(tree: &DomTree, node: NodeId) -> Result<NodeId> {
    tree.parent(node)
        .ok_or_else(|| QueryError::Structural(format!("node {node} has no parent to insert next to")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(markup: &str) -> (Session, DocumentId) {
        let mut session = Session::default();
        let id = session.new_document(markup, None).unwrap();
        (session, id)
    }

    fn body(session: &mut Session, id: DocumentId) -> String {
        session.query(id, "body").unwrap().inner_markup().unwrap()
    }

    #[test]
    fn test_append_and_prepend_markup() {
        let (mut session, id) = load("<div><i>x</i></div>");
        session
            .query(id, "div")
            .unwrap()
            .append("<b>1</b><b>2</b>")
            .unwrap()
            .prepend("<u>0</u>")
            .unwrap();
        assert_eq!(body(&mut session, id), "<div><u>0</u><i>x</i><b>1</b><b>2</b></div>");
    }

    #[test]
    fn test_before_and_after() {
        let (mut session, id) = load("<p>a</p><p>b</p>");
        session.query(id, "p:first").unwrap().after("<hr>").unwrap().before("<br>").unwrap();
        assert_eq!(body(&mut session, id), "<br><p>a</p><hr><p>b</p>");
    }

    #[test]
    fn test_fan_out_clones_after_first_target() {
        let (mut session, id) = load("<div></div><div></div><span>s</span>");
        let span = session.query(id, "span").unwrap().nodes()[0];
        let state = session.query(id, "span").unwrap().id();
        session.query(id, "div").unwrap().append(state).unwrap();

        let spans = session.query(id, "span").unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans.get(0), Some(span));
        assert_eq!(body(&mut session, id), "<div><span>s</span></div><div><span>s</span></div>");
    }

    #[test]
    fn test_after_with_neighbour_among_sources_keeps_order() {
        let (mut session, id) = load(r#"<div><i id="a"></i><i id="b"></i><i id="c"></i></div>"#);
        let moved = session.query(id, "#b, #c").unwrap().id();
        session.query(id, "#a").unwrap().after(moved).unwrap();
        assert_eq!(
            body(&mut session, id),
            r#"<div><i id="a"></i><i id="b"></i><i id="c"></i></div>"#
        );

        let moved = session.query(id, "#c, #a").unwrap().id();
        session.query(id, "div").unwrap().prepend(moved).unwrap();
        assert_eq!(
            body(&mut session, id),
            r#"<div><i id="c"></i><i id="a"></i><i id="b"></i></div>"#
        );
    }

    #[test]
    fn test_inverted_verbs() {
        let (mut session, id) = load(r#"<ul><li id="a">a</li></ul>"#);
        session.import(id, "<li>z</li>").unwrap().append_to("ul").unwrap();
        session.import(id, "<li>0</li>").unwrap().prepend_to("ul").unwrap();
        session.import(id, "<li>1</li>").unwrap().insert_after("#a").unwrap();
        assert_eq!(
            session.query(id, "ul").unwrap().inner_markup().unwrap(),
            r#"<li>0</li><li id="a">a</li><li>1</li><li>z</li>"#
        );
    }

    #[test]
    fn test_after_without_parent_is_structural() {
        let (mut session, id) = load("<p>a</p>");
        let before = body(&mut session, id);
        let detached = session.import(id, "<i>x</i>").unwrap();
        assert!(matches!(detached.after("<b>y</b>"), Err(QueryError::Structural(_))));
        assert!(matches!(
            session.document(id).unwrap().before("<b>y</b>"),
            Err(QueryError::Structural(_))
        ));
        assert_eq!(body(&mut session, id), before);
    }

    #[test]
    fn test_remove_and_replace() {
        let (mut session, id) = load(r#"<p class="x">1</p><p>2</p><em>e</em>"#);
        session.query(id, "p").unwrap().remove(Some(".x")).unwrap();
        assert_eq!(body(&mut session, id), "<p>2</p><em>e</em>");

        session.query(id, "em").unwrap().replace_with("<strong>s</strong>").unwrap();
        assert_eq!(body(&mut session, id), "<p>2</p><strong>s</strong>");

        session.import(id, "<hr>").unwrap().replace_all("p").unwrap();
        assert_eq!(body(&mut session, id), "<hr><strong>s</strong>");
    }

    #[test]
    fn test_deep_clone_is_detached() {
        let (mut session, id) = load("<p><b>x</b></p>");
        let copy = session.query(id, "p").unwrap().deep_clone().unwrap();
        let node = copy.nodes()[0];
        assert_eq!(copy.document().unwrap().tree.parent(node), None);
        assert_eq!(copy.outer_markup().unwrap(), "<p><b>x</b></p>");
        assert_eq!(session.query(id, "p").unwrap().len(), 1);
    }
}
