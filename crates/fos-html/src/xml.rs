//! XML / XHTML reader and writer (quick-xml)

use fos_dom::{Attribute, DomTree, ElementData, Node, NodeData, NodeId, QualName};
use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::encoding::Decoder;

use crate::ParseError;

/// Temporary holder element for fragment parsing
const FRAGMENT_ROOT: &str = "fos-fragment";

/// Parse a whole XML document
pub(crate) fn parse_tree(markup: &str) -> Result<DomTree, ParseError> {
    let mut tree = DomTree::new();
    read_into(&mut tree, NodeId::ROOT, markup)?;
    Ok(tree)
}

/// Parse a snippet into detached top-level nodes
pub(crate) fn parse_fragment(tree: &mut DomTree, markup: &str) -> Result<Vec<NodeId>, ParseError> {
    let holder = tree.create_element(QualName::plain(FRAGMENT_ROOT));
    read_into(tree, holder, markup)?;
    let nodes: Vec<NodeId> = tree.children(holder).collect();
    tree.remove_children(holder);
    Ok(nodes)
}

fn decode(decoder: Decoder, raw: &[u8]) -> Result<String, ParseError> {
    decoder
        .decode(raw)
        .map(|s| s.into_owned())
        .map_err(|err| ParseError::Xml(format!("decode error: {err:?}")))
}

fn read_into(tree: &mut DomTree, root: NodeId, markup: &str) -> Result<(), ParseError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(false);
    let decoder = reader.decoder();
    let mut stack = vec![root];

    loop {
        let parent = stack.last().copied().unwrap_or(root);
        let event = reader
            .read_event()
            .map_err(|err| ParseError::Xml(format!("{err} at byte {}", reader.error_position())))?;

        match event {
            Event::Start(e) => {
                let id = element_from(tree, decoder, &e)?;
                tree.append_child(parent, id)?;
                stack.push(id);
            }
            Event::Empty(e) => {
                let id = element_from(tree, decoder, &e)?;
                tree.append_child(parent, id)?;
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(e) => {
                let text = e
                    .decode()
                    .map_err(|err| ParseError::Xml(format!("decode error: {err:?}")))?;
                push_text(tree, parent, &text)?;
            }
            Event::GeneralRef(e) => {
                let name = e
                    .decode()
                    .map_err(|err| ParseError::Xml(format!("decode error: {err:?}")))?;
                let entity = format!("&{name};");
                let resolved =
                    unescape(&entity).map_err(|err| ParseError::Xml(format!("{err:?}")))?;
                push_text(tree, parent, &resolved)?;
            }
            Event::CData(e) => {
                let text = decode(decoder, &e)?;
                push_text(tree, parent, &text)?;
            }
            Event::Comment(e) => {
                let text = decode(decoder, &e)?;
                let id = tree.create_comment(text);
                tree.append_child(parent, id)?;
            }
            Event::PI(e) => {
                let data = NodeData::ProcessingInstruction {
                    target: decode(decoder, e.target())?,
                    data: decode(decoder, e.content())?.trim().to_string(),
                };
                let id = tree.alloc(Node::new(data));
                tree.append_child(parent, id)?;
            }
            Event::Decl(e) => {
                let mut data = String::from("version=\"");
                data.push_str(&decode(decoder, &e.version().map_err(|err| ParseError::Xml(format!("{err:?}")))?)?);
                data.push('"');
                if let Some(Ok(encoding)) = e.encoding() {
                    data.push_str(&format!(" encoding=\"{}\"", decode(decoder, &encoding)?));
                }
                let id = tree.alloc(Node::new(NodeData::ProcessingInstruction {
                    target: "xml".into(),
                    data,
                }));
                tree.append_child(parent, id)?;
            }
            Event::DocType(e) => {
                let name = decode(decoder, &e)?.trim().to_string();
                let id = tree.alloc(Node::new(NodeData::Doctype {
                    name,
                    public_id: String::new(),
                    system_id: String::new(),
                }));
                tree.append_child(parent, id)?;
            }
            Event::Eof => break,
        }
    }
    Ok(())
}

fn element_from(tree: &mut DomTree, decoder: Decoder, start: &BytesStart<'_>) -> Result<NodeId, ParseError> {
    let name = decode(decoder, start.name().as_ref())?;
    let mut elem = ElementData::new(QualName::parse(&name));
    for attr in start.attributes() {
        let attr = attr.map_err(|err| ParseError::Xml(format!("{err:?}")))?;
        let key = decode(decoder, attr.key.as_ref())?;
        let raw = decode(decoder, &attr.value)?;
        let value = unescape(&raw)
            .map_err(|err| ParseError::Xml(format!("{err:?}")))?
            .into_owned();
        elem.attrs.push(Attribute {
            name: QualName::parse(&key),
            value,
        });
    }
    Ok(tree.alloc(Node::new(NodeData::Element(elem))))
}

/// Append text, merging with a trailing text sibling
fn push_text(tree: &mut DomTree, parent: NodeId, text: &str) -> Result<(), ParseError> {
    if text.is_empty() {
        return Ok(());
    }
    if let Some(last) = tree.last_child(parent) {
        if let Some(Node { data: NodeData::Text(existing), .. }) = tree.get_mut(last) {
            existing.push_str(text);
            return Ok(());
        }
    }
    let id = tree.create_text(text);
    tree.append_child(parent, id)?;
    Ok(())
}

/// Serialize a node as XML into `out`
pub(crate) fn write_node(tree: &DomTree, id: NodeId, out: &mut String) {
    let Some(node) = tree.get(id) else { return };
    match &node.data {
        NodeData::Document => write_children(tree, id, out),
        NodeData::Doctype { name, .. } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text(text) => out.push_str(&partial_escape(text.as_str())),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if !data.is_empty() {
                out.push(' ');
                out.push_str(data);
            }
            out.push_str("?>");
        }
        NodeData::Element(elem) => {
            let name = elem.name.tag_name();
            out.push('<');
            out.push_str(&name);
            for attr in &elem.attrs {
                out.push(' ');
                out.push_str(&attr.name.tag_name());
                out.push_str("=\"");
                out.push_str(&escape(attr.value.as_str()));
                out.push('"');
            }
            if node.first_child.is_valid() {
                out.push('>');
                write_children(tree, id, out);
                out.push_str("</");
                out.push_str(&name);
                out.push('>');
            } else {
                out.push_str("/>");
            }
        }
    }
}

pub(crate) fn write_children(tree: &DomTree, id: NodeId, out: &mut String) {
    for child in tree.children(id) {
        write_node(tree, child, out);
    }
}
