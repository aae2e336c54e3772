//! Attributes, classes, data and form values

use fos_dom::{Document, NodeId};
use fos_html::inner_markup;

use crate::error::Result;
use crate::selector::has_classes;
use crate::Selection;

impl<'s> Selection<'s> {
    // ---- attributes ----

    /// Attribute of the first element
    pub fn attr(&self, name: &str) -> Result<Option<String>> {
        let tree = &self.document()?.tree;
        Ok(self
            .elements()?
            .first()
            .and_then(|&n| tree.get_attribute(n, name))
            .map(str::to_string))
    }

    /// All attributes of the first element, in source order
    pub fn attrs(&self) -> Result<Vec<(String, String)>> {
        let tree = &self.document()?.tree;
        Ok(self
            .elements()?
            .first()
            .map(|&n| {
                tree.attributes(n)
                    .iter()
                    .map(|a| (a.name.tag_name(), a.value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Set an attribute on every element; `*` sets every existing attribute
    pub fn set_attr(mut self, name: &str, value: &str) -> Result<Self> {
        let elements = self.elements()?;
        let tree = &mut self.document_mut()?.tree;
        for node in elements {
            for name in target_names(tree.attributes(node).iter().map(|a| a.name.tag_name()), name) {
                tree.set_attribute(node, &name, value);
            }
        }
        Ok(self)
    }

    /// Remove an attribute from every element; `*` removes them all
    pub fn remove_attr(mut self, name: &str) -> Result<Self> {
        let elements = self.elements()?;
        let tree = &mut self.document_mut()?.tree;
        for node in elements {
            for name in target_names(tree.attributes(node).iter().map(|a| a.name.tag_name()), name) {
                tree.remove_attribute(node, &name);
            }
        }
        Ok(self)
    }

    /// `data-<key>` of the first element
    pub fn data(&self, key: &str) -> Result<Option<String>> {
        self.attr(&format!("data-{key}"))
    }

    pub fn set_data(self, key: &str, value: &str) -> Result<Self> {
        self.set_attr(&format!("data-{key}"), value)
    }

    pub fn remove_data(self, key: &str) -> Result<Self> {
        self.remove_attr(&format!("data-{key}"))
    }

    // ---- classes ----

    pub fn has_class(&self, class: &str) -> Result<bool> {
        let tree = &self.document()?.tree;
        let wanted = [class.to_string()];
        Ok(self
            .nodes()
            .iter()
            .any(|&n| has_classes(tree.get_attribute(n, "class"), &wanted)))
    }

    /// Append `class` to elements that lack it
    pub fn add_class(mut self, class: &str) -> Result<Self> {
        let elements = self.elements()?;
        let tree = &mut self.document_mut()?.tree;
        let wanted = [class.to_string()];
        for node in elements {
            let current = tree.get_attribute(node, "class");
            if has_classes(current, &wanted) {
                continue;
            }
            let value = format!("{} {class}", current.unwrap_or_default());
            tree.set_attribute(node, "class", value.trim());
        }
        Ok(self)
    }

    /// Remove `class`; an attribute left empty is dropped
    pub fn remove_class(mut self, class: &str) -> Result<Self> {
        let elements = self.elements()?;
        let tree = &mut self.document_mut()?.tree;
        for node in elements {
            let Some(current) = tree.get_attribute(node, "class") else {
                continue;
            };
            let rest: Vec<&str> = current.split_whitespace().filter(|c| *c != class).collect();
            if rest.is_empty() {
                tree.remove_attribute(node, "class");
            } else {
                let value = rest.join(" ");
                tree.set_attribute(node, "class", value);
            }
        }
        Ok(self)
    }

    /// Add or remove `class` per element
    pub fn toggle_class(mut self, class: &str) -> Result<Self> {
        let elements = self.elements()?;
        let tree = &mut self.document_mut()?.tree;
        for node in elements {
            let current = tree.get_attribute(node, "class").unwrap_or_default();
            let had = current.split_whitespace().any(|c| c == class);
            let mut classes: Vec<&str> = current.split_whitespace().filter(|c| *c != class).collect();
            if !had {
                classes.push(class);
            }
            let value = classes.join(" ");
            if value.is_empty() {
                tree.remove_attribute(node, "class");
            } else {
                tree.set_attribute(node, "class", value);
            }
        }
        Ok(self)
    }

    // ---- form values ----

    /// Value of the first element
    ///
    /// A `select` yields its first selected option (value, or text when the
    /// option has no value); a `textarea` yields its content.
    pub fn val(&self) -> Result<Option<String>> {
        let document = self.document()?;
        let Some(&node) = self.elements()?.first() else {
            return Ok(None);
        };
        let tree = &document.tree;
        if document.tag_matches(node, "select") {
            let selected = tree
                .descendants(node)
                .find(|&o| document.tag_matches(o, "option") && tree.has_attribute(o, "selected"));
            return Ok(selected.map(|o| {
                tree.get_attribute(o, "value")
                    .map(str::to_string)
                    .unwrap_or_else(|| tree.text_content(o))
            }));
        }
        if document.tag_matches(node, "textarea") {
            return Ok(Some(inner_markup(document, node)?));
        }
        Ok(tree.get_attribute(node, "value").map(str::to_string))
    }

    pub fn set_val(self, value: &str) -> Result<Self> {
        self.set_vals(&[value])
    }

    /// Set form values
    ///
    /// Checkboxes and radios are checked when their value or name is listed,
    /// select options are selected by value, textareas get the values as
    /// content and other elements the joined `value` attribute.
    pub fn set_vals(mut self, values: &[&str]) -> Result<Self> {
        let elements = self.elements()?;
        let document = self.document_mut()?;
        for node in elements {
            set_value(document, node, values)?;
        }
        Ok(self)
    }
}

fn set_value(document: &mut Document, node: NodeId, values: &[&str]) -> Result<()> {
    let listed = |v: Option<&str>| v.is_some_and(|v| values.contains(&v));

    if document.tag_matches(node, "input") {
        let kind = document.tree.get_attribute(node, "type").unwrap_or_default();
        if kind.eq_ignore_ascii_case("checkbox") || kind.eq_ignore_ascii_case("radio") {
            let tree = &mut document.tree;
            if listed(tree.get_attribute(node, "value")) || listed(tree.get_attribute(node, "name")) {
                tree.set_attribute(node, "checked", "checked");
            } else {
                tree.remove_attribute(node, "checked");
            }
            return Ok(());
        }
    }

    if document.tag_matches(node, "select") {
        let options: Vec<NodeId> = document
            .tree
            .descendants(node)
            .filter(|&o| document.tag_matches(o, "option"))
            .collect();
        for option in options {
            let key = match document.tree.get_attribute(option, "value") {
                Some(value) => value.to_string(),
                None => inner_markup(document, option)?,
            };
            if values.contains(&key.as_str()) {
                document.tree.set_attribute(option, "selected", "selected");
            } else {
                document.tree.remove_attribute(option, "selected");
            }
        }
        return Ok(());
    }

    if document.tag_matches(node, "textarea") {
        let tree = &mut document.tree;
        tree.remove_children(node);
        let text = tree.create_text(values.concat());
        tree.append_child(node, text)?;
        return Ok(());
    }

    document.tree.set_attribute(node, "value", values.join(","));
    Ok(())
}

/// Names an attribute operation applies to; `*` expands to all present
fn target_names(present: impl Iterator<Item = String>, name: &str) -> Vec<String> {
    if name == "*" {
        present.collect()
    } else {
        vec![name.to_string()]
    }
}
