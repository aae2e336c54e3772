//! Style Cascade & Resolver
//!
//! Resolved styles live in a side table keyed by node identity:
//! 1. Rules are applied per matched element, highest specificity wins
//!    (ties go to the later rule)
//! 2. Inline `style` attributes and legacy presentational attributes are
//!    applied at inline specificity
//! 3. Values bubble down to descendants that lack an equal-or-stronger
//!    value of their own

use std::collections::{BTreeMap, HashMap};

use fos_dom::{DomTree, NodeId};

use crate::{parse_inline_declarations, Declaration};

/// Resolved value of one property on one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleValue {
    pub value: String,
    pub specificity: u32,
}

/// Properties of one element, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleRecord {
    properties: BTreeMap<String, StyleValue>,
}

impl StyleRecord {
    pub fn get(&self, property: &str) -> Option<&StyleValue> {
        self.properties.get(property)
    }

    /// Store `value` unless an existing value is strictly stronger
    pub fn offer(&mut self, property: &str, value: &str, specificity: u32) -> bool {
        match self.properties.get(property) {
            Some(existing) if existing.specificity > specificity => false,
            _ => {
                self.set(property, value, specificity);
                true
            }
        }
    }

    /// Store unconditionally
    pub fn set(&mut self, property: &str, value: &str, specificity: u32) {
        self.properties.insert(
            property.to_string(),
            StyleValue {
                value: value.to_string(),
                specificity,
            },
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// `prop:value;prop:value` for every property at or above `threshold`
    pub fn inline_text(&self, threshold: u32) -> String {
        self.properties
            .iter()
            .filter(|(_, v)| v.specificity >= threshold)
            .map(|(k, v)| format!("{}:{}", k, v.value))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Per-document style side table
#[derive(Debug, Default)]
pub struct StyleTable {
    records: HashMap<NodeId, StyleRecord>,
    /// `display` values stashed by `hide()` for `show()`
    pub saved_display: HashMap<NodeId, String>,
    parsed: bool,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the document's styles have been resolved
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    pub fn mark_parsed(&mut self) {
        self.parsed = true;
    }

    pub fn record(&self, node: NodeId) -> Option<&StyleRecord> {
        self.records.get(&node)
    }

    pub fn value(&self, node: NodeId, property: &str) -> Option<&StyleValue> {
        self.records.get(&node).and_then(|r| r.get(property))
    }

    /// Apply one rule's declarations to every matched element
    pub fn apply_rule(&mut self, nodes: &[NodeId], specificity: u32, declarations: &[Declaration]) {
        for &node in nodes {
            let record = self.records.entry(node).or_default();
            for decl in declarations {
                record.offer(&decl.property, &decl.value, specificity);
            }
        }
    }

    /// Apply legacy presentational attributes, then `style` attributes,
    /// of every connected element
    pub fn apply_inline(&mut self, tree: &DomTree, legacy: &[(String, String)], specificity: u32) {
        for node in tree.descendants(NodeId::ROOT).filter(|&n| tree.is_element(n)) {
            let mut declarations: Vec<Declaration> = legacy
                .iter()
                .filter_map(|(attr, property)| {
                    tree.get_attribute(node, attr)
                        .map(|value| Declaration::new(property.as_str(), value))
                })
                .collect();

            if let Some(style) = tree.get_attribute(node, "style") {
                match parse_inline_declarations(style) {
                    Ok(decls) => declarations.extend(decls),
                    Err(err) => tracing::warn!(node = %node, %err, "ignoring style attribute"),
                }
            }

            if !declarations.is_empty() {
                self.apply_rule(&[node], specificity, &declarations);
            }
        }
    }

    /// Push values from `from` down its subtree
    ///
    /// A descendant takes a value only when its own value for that property
    /// is strictly weaker.
    pub fn bubble(&mut self, tree: &DomTree, from: NodeId) {
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            let inherited: Vec<(String, StyleValue)> = self
                .records
                .get(&node)
                .map(|r| r.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
                .unwrap_or_default();

            let children: Vec<NodeId> = tree.element_children(node).collect();
            for &child in children.iter().rev() {
                if !inherited.is_empty() {
                    let record = self.records.entry(child).or_default();
                    for (property, value) in &inherited {
                        let weaker = record
                            .get(property)
                            .is_none_or(|own| own.specificity < value.specificity);
                        if weaker {
                            record.set(property, &value.value, value.specificity);
                        }
                    }
                }
                stack.push(child);
            }
        }
    }

    /// Imperative set: one above the current specificity, or `inline` if
    /// unset. Re-bubbles from the element and returns the new specificity.
    pub fn set_property(
        &mut self,
        tree: &DomTree,
        node: NodeId,
        property: &str,
        value: &str,
        inline: u32,
    ) -> u32 {
        let record = self.records.entry(node).or_default();
        let specificity = record
            .get(property)
            .map(|v| v.specificity + 1)
            .unwrap_or(inline);
        record.set(property, value, specificity);
        self.bubble(tree, node);
        specificity
    }

    /// Forget everything (document reloaded)
    pub fn clear(&mut self) {
        self.records.clear();
        self.saved_display.clear();
        self.parsed = false;
    }
}
