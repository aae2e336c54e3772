//! Document construction and markup import
//!
//! HTML goes through html5ever's RcDom and is converted into our arena DOM.
//! XML and XHTML are handed to the quick-xml reader in [`crate::xml`].

use fos_dom::{Attribute, Document, DocumentKind, DomTree, ElementData, Node, NodeData, NodeId, QualName};
use html5ever::tendril::TendrilSink;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::{xml, ContentType, ParseError};

/// Build a document from markup, detecting the charset when the content
/// type names none (falls back to UTF-8)
pub fn parse_document(markup: &str, content_type: &ContentType) -> Result<Document, ParseError> {
    parse_with_charset(markup, content_type, "UTF-8")
}

/// Like [`parse_document`] with an explicit fallback charset
pub fn parse_with_charset(
    markup: &str,
    content_type: &ContentType,
    default_charset: &str,
) -> Result<Document, ParseError> {
    let charset = content_type
        .charset
        .clone()
        .or_else(|| detect_charset(markup))
        .unwrap_or_else(|| default_charset.to_string());
    let kind = content_type.kind();
    tracing::debug!(mime = %content_type.mime, %charset, bytes = markup.len(), "parsing document");

    let tree = match kind {
        DocumentKind::Html => {
            let dom = parse_html(markup);
            let mut tree = DomTree::new();
            for child in dom.document.children.borrow().iter() {
                convert_node(child, &mut tree, Some(NodeId::ROOT))?;
            }
            tree
        }
        DocumentKind::Xml | DocumentKind::Xhtml => xml::parse_tree(markup)?,
    };

    let mut document = Document::from_tree(tree, kind, &charset);
    document.content_type = content_type.mime.clone();
    tracing::debug!(nodes = document.tree.len(), "parsed document");
    Ok(document)
}

/// Parse markup into detached nodes owned by `document`
///
/// Returns the top-level nodes in source order. HTML snippets without an
/// `<html>` tag yield the parsed head content followed by the body content.
pub fn import_markup(document: &mut Document, markup: &str) -> Result<Vec<NodeId>, ParseError> {
    if document.is_xml() {
        return xml::parse_fragment(&mut document.tree, markup);
    }

    let dom = parse_html(markup);
    let html = dom
        .document
        .children
        .borrow()
        .iter()
        .find(|h| element_local_name(h).as_deref() == Some("html"))
        .cloned();
    let Some(html) = html else {
        return Ok(Vec::new());
    };

    if markup.to_ascii_lowercase().contains("<html") {
        return Ok(convert_node(&html, &mut document.tree, None)?.into_iter().collect());
    }

    let mut imported = Vec::new();
    for section in html.children.borrow().iter() {
        if !matches!(element_local_name(section).as_deref(), Some("head") | Some("body")) {
            continue;
        }
        for child in section.children.borrow().iter() {
            imported.extend(convert_node(child, &mut document.tree, None)?);
        }
    }
    Ok(imported)
}

/// True when the input looks like markup rather than a selector
pub fn is_markup(input: &str) -> bool {
    input.trim_start().starts_with('<')
}

fn parse_html(markup: &str) -> RcDom {
    html5ever::parse_document(RcDom::default(), ParseOpts::default()).one(markup)
}

fn element_local_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        RcNodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

/// Charset declared by a `<meta>` tag or the XML declaration
fn detect_charset(markup: &str) -> Option<String> {
    let lower = markup.to_ascii_lowercase();
    let mut end = lower.len().min(4096);
    while !lower.is_char_boundary(end) {
        end -= 1;
    }
    let head = &lower[..end];

    if head.trim_start().starts_with("<?xml") {
        let decl = &head[..head.find("?>")?];
        let value = decl.split("encoding=").nth(1)?;
        return quoted_value(value);
    }

    head.match_indices("<meta").find_map(|(pos, _)| {
        let tag = &head[pos..pos + head[pos..].find('>')?];
        let value = tag.split("charset=").nth(1)?;
        quoted_value(value)
    })
}

fn quoted_value(raw: &str) -> Option<String> {
    let raw = raw.trim_start_matches(['"', '\'']);
    let end = raw
        .find(|c: char| c == '"' || c == '\'' || c == ';' || c == '>' || c.is_whitespace())
        .unwrap_or(raw.len());
    (end > 0).then(|| raw[..end].to_uppercase())
}

fn convert_name(name: &html5ever::QualName) -> QualName {
    QualName::new(
        name.prefix.as_ref().map(|p| p.to_string()),
        name.ns.to_string(),
        name.local.to_string(),
    )
}

/// Convert an RcDom node (and its subtree) into `tree`
fn convert_node(handle: &Handle, tree: &mut DomTree, parent: Option<NodeId>) -> Result<Option<NodeId>, ParseError> {
    let data = match &handle.data {
        RcNodeData::Document => {
            for child in handle.children.borrow().iter() {
                convert_node(child, tree, parent)?;
            }
            return Ok(None);
        }
        RcNodeData::Doctype {
            name,
            public_id,
            system_id,
        } => NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        },
        RcNodeData::Text { contents } => NodeData::Text(contents.borrow().to_string()),
        RcNodeData::Comment { contents } => NodeData::Comment(contents.to_string()),
        RcNodeData::ProcessingInstruction { target, contents } => NodeData::ProcessingInstruction {
            target: target.to_string(),
            data: contents.to_string(),
        },
        RcNodeData::Element { name, attrs, .. } => {
            let mut elem = ElementData::new(convert_name(name));
            for attr in attrs.borrow().iter() {
                elem.attrs.push(Attribute {
                    name: convert_name(&attr.name),
                    value: attr.value.to_string(),
                });
            }
            NodeData::Element(elem)
        }
    };

    let id = tree.alloc(Node::new(data));
    if let Some(parent) = parent {
        tree.append_child(parent, id)?;
    }

    for child in handle.children.borrow().iter() {
        convert_node(child, tree, Some(id))?;
    }
    if let RcNodeData::Element { template_contents, .. } = &handle.data {
        if let Some(contents) = template_contents.borrow().as_ref() {
            for child in contents.children.borrow().iter() {
                convert_node(child, tree, Some(id))?;
            }
        }
    }
    Ok(Some(id))
}
