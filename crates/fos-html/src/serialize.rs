//! Markup serialization
//!
//! HTML documents are written through html5ever's serializer so void
//! elements, raw-text elements and escaping follow the HTML rules. XML
//! documents use the writer in [`crate::xml`].

use std::io;

use fos_dom::{Document, DomTree, NodeData, NodeId, QualName};
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace};

use crate::{xml, ParseError};

/// Markup of the node's children
pub fn inner_markup(document: &Document, id: NodeId) -> Result<String, ParseError> {
    if document.is_xml() {
        let mut out = String::new();
        xml::write_children(&document.tree, id, &mut out);
        return Ok(out);
    }
    let context = document.tree.element(id).map(|e| html_name(&e.name));
    write_html(&document.tree, id, TraversalScope::ChildrenOnly(context))
}

/// Markup of the node itself
pub fn outer_markup(document: &Document, id: NodeId) -> Result<String, ParseError> {
    if document.is_xml() {
        let mut out = String::new();
        xml::write_node(&document.tree, id, &mut out);
        return Ok(out);
    }
    write_html(&document.tree, id, TraversalScope::IncludeNode)
}

fn write_html(tree: &DomTree, id: NodeId, traversal_scope: TraversalScope) -> Result<String, ParseError> {
    let mut buf = Vec::new();
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };
    serialize(&mut buf, &SerializableNode { tree, id }, opts)?;
    String::from_utf8(buf).map_err(|err| ParseError::Serialize(err.to_string()))
}

/// Element name as html5ever expects it; prefixes fold into the local name
fn html_name(name: &QualName) -> html5ever::QualName {
    html5ever::QualName::new(
        None,
        Namespace::from(name.ns.as_str()),
        LocalName::from(name.tag_name()),
    )
}

fn attr_name(name: &QualName) -> html5ever::QualName {
    html5ever::QualName::new(None, Namespace::from(""), LocalName::from(name.tag_name()))
}

/// Adapter exposing an arena subtree to html5ever
struct SerializableNode<'a> {
    tree: &'a DomTree,
    id: NodeId,
}

impl SerializableNode<'_> {
    fn write_node<S: Serializer>(&self, serializer: &mut S, id: NodeId) -> io::Result<()> {
        let Some(node) = self.tree.get(id) else {
            return Ok(());
        };
        match &node.data {
            NodeData::Document => self.write_children(serializer, id),
            NodeData::Doctype { name, .. } => serializer.write_doctype(name),
            NodeData::Text(text) => serializer.write_text(text),
            NodeData::Comment(text) => serializer.write_comment(text),
            NodeData::ProcessingInstruction { target, data } => {
                serializer.write_processing_instruction(target, data)
            }
            NodeData::Element(elem) => {
                let name = html_name(&elem.name);
                let attrs: Vec<(html5ever::QualName, &str)> = elem
                    .attrs
                    .iter()
                    .map(|a| (attr_name(&a.name), a.value.as_str()))
                    .collect();
                serializer.start_elem(name.clone(), attrs.iter().map(|(n, v)| (n, *v)))?;
                self.write_children(serializer, id)?;
                serializer.end_elem(name)
            }
        }
    }

    fn write_children<S: Serializer>(&self, serializer: &mut S, id: NodeId) -> io::Result<()> {
        for child in self.tree.children(id) {
            self.write_node(serializer, child)?;
        }
        Ok(())
    }
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            TraversalScope::IncludeNode => self.write_node(serializer, self.id),
            TraversalScope::ChildrenOnly(_) => self.write_children(serializer, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_document, ContentType};

    #[test]
    fn test_html_inner_and_outer() {
        let doc = parse_document(
            r#"<html><body><div id="x">a<br><b>c</b></div></body></html>"#,
            &ContentType::html(),
        )
        .unwrap();
        let div = doc.get_element_by_id("x").unwrap();

        assert_eq!(inner_markup(&doc, div).unwrap(), "a<br><b>c</b>");
        assert_eq!(outer_markup(&doc, div).unwrap(), r#"<div id="x">a<br><b>c</b></div>"#);
    }

    #[test]
    fn test_html_text_is_escaped() {
        let mut doc = parse_document("<p></p>", &ContentType::html()).unwrap();
        let p = doc
            .tree
            .descendants(NodeId::ROOT)
            .find(|&n| doc.tree.tag_name(n).as_deref() == Some("p"))
            .unwrap();
        let text = doc.tree.create_text("1 < 2 & 3");
        doc.tree.append_child(p, text).unwrap();
        assert_eq!(inner_markup(&doc, p).unwrap(), "1 &lt; 2 &amp; 3");
    }

    #[test]
    fn test_xml_outer() {
        let doc = parse_document("<feed><entry a=\"1\"/></feed>", &ContentType::xml()).unwrap();
        let feed = doc.document_element().unwrap();
        assert_eq!(outer_markup(&doc, feed).unwrap(), "<feed><entry a=\"1\"/></feed>");
        assert_eq!(inner_markup(&doc, feed).unwrap(), "<entry a=\"1\"/>");
    }
}
