//! Computed styles on a selection
//!
//! A document's style table is built on the first style read or write:
//! rules from its `<style>` blocks, then legacy presentational attributes
//! and `style` attributes, then one bubbling pass from the document node.

use fos_css::{parse_stylesheet, StyleTable};
use fos_dom::{DocumentId, NodeId};

use crate::error::{QueryError, Result};
use crate::selector::{find, Selector};
use crate::session::Session;
use crate::Selection;

impl<'s> Selection<'s> {
    /// Resolved value of `property` on the first node
    pub fn css(&mut self, property: &str) -> Result<Option<String>> {
        let document = self.document_id();
        ensure_styles(self.session, document)?;
        let Some(&node) = self.nodes().first() else {
            return Ok(None);
        };
        Ok(self
            .session
            .styles
            .get(&document)
            .and_then(|table| table.value(node, property))
            .map(|v| v.value.clone()))
    }

    /// Set `property` on every element
    ///
    /// Once the value reaches inline strength it is written back to the
    /// element's `style` attribute.
    pub fn set_css(mut self, property: &str, value: &str) -> Result<Self> {
        let document = self.document_id();
        let elements = self.elements()?;
        ensure_styles(self.session, document)?;
        for node in elements {
            set_style(self.session, document, node, property, value)?;
        }
        Ok(self)
    }

    /// Restore the `display` value saved by [`Selection::hide`]
    pub fn show(self) -> Result<Self> {
        let document = self.document_id();
        let elements = self.elements()?;
        ensure_styles(self.session, document)?;
        for node in elements {
            let saved = self
                .session
                .styles
                .get_mut(&document)
                .and_then(|table| table.saved_display.remove(&node));
            let display = saved.unwrap_or_else(|| self.session.config.default_display.clone());
            set_style(self.session, document, node, "display", &display)?;
        }
        Ok(self)
    }

    /// Set `display: none`, remembering the previous value
    pub fn hide(self) -> Result<Self> {
        let document = self.document_id();
        let elements = self.elements()?;
        ensure_styles(self.session, document)?;
        for node in elements {
            if let Some(table) = self.session.styles.get_mut(&document) {
                let current = table.value(node, "display").map(|v| v.value.clone());
                if let Some(display) = current.filter(|d| d != "none") {
                    table.saved_display.insert(node, display);
                }
            }
            set_style(self.session, document, node, "display", "none")?;
        }
        Ok(self)
    }
}

/// Resolve the style table of `id` unless already done
pub(crate) fn ensure_styles(session: &mut Session, id: DocumentId) -> Result<()> {
    if session.styles.get(&id).is_some_and(StyleTable::is_parsed) {
        return Ok(());
    }
    let Session {
        config,
        documents,
        styles,
        ..
    } = session;
    let document = documents.get_mut(id).ok_or(QueryError::DocumentNotLoaded(id))?;
    let table = styles.entry(id).or_default();

    let blocks = find(document, &[NodeId::ROOT], &Selector::parse("style")?)?;
    let css = blocks
        .iter()
        .map(|&n| document.tree.text_content(n))
        .collect::<Vec<_>>()
        .join("\n");

    for rule in &parse_stylesheet(&css).rules {
        for selector in &rule.selectors {
            let matched = Selector::parse(&selector.text).and_then(|parsed| find(document, &[NodeId::ROOT], &parsed));
            match matched {
                Ok(nodes) => table.apply_rule(&nodes, selector.specificity.score(), &rule.declarations),
                Err(err) => tracing::warn!(selector = %selector.text, %err, "skipping stylesheet selector"),
            }
        }
    }

    table.apply_inline(&document.tree, &config.legacy_style_attributes, config.inline_specificity);
    table.bubble(&document.tree, NodeId::ROOT);
    table.mark_parsed();
    tracing::debug!(document = %id, blocks = blocks.len(), "styles resolved");
    Ok(())
}

/// Imperative set on one element, mirrored into `style` at inline strength
fn set_style(session: &mut Session, id: DocumentId, node: NodeId, property: &str, value: &str) -> Result<()> {
    let Session {
        config,
        documents,
        styles,
        ..
    } = session;
    let tree = &mut documents.get_mut(id).ok_or(QueryError::DocumentNotLoaded(id))?.tree;
    let table = styles.entry(id).or_default();
    let threshold = config.inline_specificity;

    if table.set_property(tree, node, property, value, threshold) < threshold {
        return Ok(());
    }
    let inline = table
        .record(node)
        .map(|record| record.inline_text(threshold))
        .unwrap_or_default();
    if inline.is_empty() {
        tree.remove_attribute(node, "style");
    } else {
        tree.set_attribute(node, "style", inline);
    }
    Ok(())
}
