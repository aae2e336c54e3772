//! Text and markup access on a selection

use fos_dom::NodeId;
use fos_html::{import_markup, inner_markup, outer_markup};

use crate::error::Result;
use crate::Selection;

impl<'s> Selection<'s> {
    /// Text of every node; with several nodes each non-empty text ends in a newline
    pub fn text(&self) -> Result<String> {
        let tree = &self.document()?.tree;
        if let [node] = self.nodes() {
            return Ok(tree.text_content(*node));
        }
        let mut out = String::new();
        for &node in self.nodes() {
            let text = tree.text_content(node);
            if !text.is_empty() {
                out.push_str(&text);
                out.push('\n');
            }
        }
        Ok(out)
    }

    /// Replace the children of every element with a single text node
    pub fn set_text(mut self, text: &str) -> Result<Self> {
        let elements = self.elements()?;
        let tree = &mut self.document_mut()?.tree;
        let node = tree.create_text(text);
        fill(tree, &elements, &[node])?;
        Ok(self)
    }

    /// Concatenated markup of the children of every node
    pub fn inner_markup(&self) -> Result<String> {
        let document = self.document()?;
        let mut out = String::new();
        for &node in self.nodes() {
            out.push_str(&inner_markup(document, node)?);
        }
        Ok(out)
    }

    /// Concatenated markup of every node
    pub fn outer_markup(&self) -> Result<String> {
        let document = self.document()?;
        let mut out = String::new();
        for &node in self.nodes() {
            out.push_str(&outer_markup(document, node)?);
        }
        Ok(out)
    }

    /// Replace the children of every element with parsed `markup`
    pub fn set_inner_markup(mut self, markup: &str) -> Result<Self> {
        let elements = self.elements()?;
        let document = self.document_mut()?;
        let nodes = import_markup(document, markup)?;
        fill(&mut document.tree, &elements, &nodes)?;
        Ok(self)
    }

    pub fn html(&self) -> Result<String> {
        self.inner_markup()
    }

    pub fn set_html(self, markup: &str) -> Result<Self> {
        self.set_inner_markup(markup)
    }

    pub fn xml(&self) -> Result<String> {
        self.inner_markup()
    }

    pub fn set_xml(self, markup: &str) -> Result<Self> {
        self.set_inner_markup(markup)
    }

    /// Detach the children of every element
    pub fn empty(mut self) -> Result<Self> {
        let elements = self.elements()?;
        let tree = &mut self.document_mut()?.tree;
        for node in elements {
            tree.remove_children(node);
        }
        Ok(self)
    }
}

/// Empty each target and give it `nodes`; the first target gets the
/// originals, later ones deep copies
fn fill(tree: &mut fos_dom::DomTree, targets: &[NodeId], nodes: &[NodeId]) -> Result<()> {
    for (i, &target) in targets.iter().enumerate() {
        tree.remove_children(target);
        for &node in nodes {
            let node = if i == 0 { node } else { tree.deep_clone(node)? };
            tree.append_child(target, node)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::Session;

    #[test]
    fn test_text_joins_with_newlines() {
        let mut session = Session::default();
        let id = session
            .new_document("<ul><li>a</li><li></li><li>c</li></ul>", None)
            .unwrap();
        assert_eq!(session.query(id, "li").unwrap().text().unwrap(), "a\nc\n");
        assert_eq!(session.query(id, "li:first").unwrap().text().unwrap(), "a");
    }

    #[test]
    fn test_set_text_escapes() {
        let mut session = Session::default();
        let id = session.new_document("<p>x</p><p>y</p>", None).unwrap();
        let p = session.query(id, "p").unwrap().set_text("<b>").unwrap();
        assert_eq!(p.outer_markup().unwrap(), "<p>&lt;b&gt;</p><p>&lt;b&gt;</p>");
    }

    #[test]
    fn test_set_inner_markup_copies_to_each_target() {
        let mut session = Session::default();
        let id = session.new_document("<div></div><div>old</div>", None).unwrap();
        session
            .query(id, "div")
            .unwrap()
            .set_inner_markup("<span>n</span>")
            .unwrap();
        let spans = session.query(id, "div > span").unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(session.query(id, "div").unwrap().html().unwrap(), "<span>n</span><span>n</span>");
    }

    #[test]
    fn test_empty() {
        let mut session = Session::default();
        let id = session.new_document("<div><b>1</b>2</div>", None).unwrap();
        let div = session.query(id, "div").unwrap().empty().unwrap();
        assert_eq!(div.inner_markup().unwrap(), "");
    }
}
