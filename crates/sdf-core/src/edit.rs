//! Selector-driven document edits.
//!
//! Every operation first runs [`find`] over the document, then applies the
//! change to each hit. `replace` and `remove` only touch the topmost hits:
//! when one hit sits inside another, editing the outer one already disposes
//! of the inner one. Operations that shift sibling positions are applied
//! deepest-and-rightmost first so the positions recorded for earlier hits
//! stay valid.

use crate::error::{Result, SdfError};
use crate::matcher::find;
use crate::value::Value;
use crate::view::Step;

/// Walk `steps` down from `root` to the value they address.
pub(crate) fn resolve_mut<'v>(root: &'v mut Value, steps: &[Step]) -> Option<&'v mut Value> {
    let mut current = root;
    for step in steps {
        let node = current.as_node_mut()?;
        current = match step {
            Step::Child(index) => node.children.get_mut(*index)?,
            Step::Attribute(index) => node.attribute_value_mut_at(*index),
        };
    }
    Some(current)
}

/// Positions of all hits, as step paths from the root.
fn hit_paths(document: &Value, selector: &str) -> Result<Vec<Vec<Step>>> {
    let matches = find(document, selector)?;
    let view = matches.view();
    Ok(matches.ids().iter().map(|&id| view.steps(id)).collect())
}

/// Drop every hit that lies inside another hit.
fn topmost(mut paths: Vec<Vec<Step>>) -> Vec<Vec<Step>> {
    let all = paths.clone();
    paths.retain(|path| {
        !all.iter()
            .any(|other| other.len() < path.len() && path.starts_with(other))
    });
    paths
}

fn edit_error(message: &str) -> SdfError {
    SdfError::Edit(message.to_string())
}

impl Value {
    /// Replace every element matching `selector` with a copy of `new_value`.
    /// Replacing the root yields `new_value` itself.
    pub fn replace(mut self, selector: &str, new_value: &Value) -> Result<Value> {
        let paths = topmost(hit_paths(&self, selector)?);
        if paths.iter().any(|p| p.is_empty()) {
            return Ok(new_value.clone());
        }

        for path in &paths {
            let (last, parent_path) = split_last(path);
            let Some(parent) = resolve_mut(&mut self, parent_path).and_then(Value::as_node_mut)
            else {
                return Err(edit_error("Matched element's parent is not a node."));
            };
            match last {
                Step::Child(index) => parent.children[index] = new_value.clone(),
                Step::Attribute(index) => parent.set_attribute_at(index, new_value.clone()),
            }
        }
        Ok(self)
    }

    /// Remove every element matching `selector`. Removing the root leaves no
    /// document, hence the `Option`.
    pub fn remove(mut self, selector: &str) -> Result<Option<Value>> {
        let mut paths = topmost(hit_paths(&self, selector)?);
        if paths.iter().any(|p| p.is_empty()) {
            return Ok(None);
        }

        // rightmost first, so earlier sibling positions survive removal
        paths.sort();
        for path in paths.iter().rev() {
            let (last, parent_path) = split_last(path);
            let Some(parent) = resolve_mut(&mut self, parent_path).and_then(Value::as_node_mut)
            else {
                return Err(edit_error("Matched element's parent is not a node."));
            };
            match last {
                Step::Child(index) => {
                    parent.children.remove(index);
                }
                Step::Attribute(index) => parent.remove_attribute_at(index),
            }
        }
        Ok(Some(self))
    }

    /// Add an attribute to every node matching `selector`.
    pub fn add_attribute(&mut self, selector: &str, name: &str, value: &Value) -> Result<()> {
        for path in hit_paths(self, selector)? {
            let Some(node) = resolve_mut(self, &path).and_then(Value::as_node_mut) else {
                return Err(edit_error("Cannot add an attribute to something but a node."));
            };
            if !node.insert_attribute(name, value.clone()) {
                return Err(edit_error(
                    "Cannot add an attribute, because attribute with such name already exists.",
                ));
            }
        }
        Ok(())
    }

    /// Append a copy of `value` to the children of every node matching
    /// `selector`.
    pub fn add_child(&mut self, selector: &str, value: &Value) -> Result<()> {
        for path in hit_paths(self, selector)? {
            let Some(node) = resolve_mut(self, &path).and_then(Value::as_node_mut) else {
                return Err(edit_error("Cannot add a child to something but a node."));
            };
            node.children.push(value.clone());
        }
        Ok(())
    }

    /// Insert a copy of `value` at `index` into the children of every node
    /// matching `selector`.
    pub fn insert_at(&mut self, selector: &str, index: usize, value: &Value) -> Result<()> {
        let mut paths = hit_paths(self, selector)?;
        paths.sort();
        for path in paths.iter().rev() {
            let Some(node) = resolve_mut(self, path).and_then(Value::as_node_mut) else {
                return Err(edit_error("Cannot insert a child into something but a node."));
            };
            if index > node.children.len() {
                return Err(edit_error("Insert position is out of bounds."));
            }
            node.children.insert(index, value.clone());
        }
        Ok(())
    }

    /// Insert a copy of `value` directly before every element matching
    /// `selector`.
    pub fn insert_before(&mut self, selector: &str, value: &Value) -> Result<()> {
        self.insert_adjacent(selector, value, 0)
    }

    /// Insert a copy of `value` directly after every element matching
    /// `selector`.
    pub fn insert_after(&mut self, selector: &str, value: &Value) -> Result<()> {
        self.insert_adjacent(selector, value, 1)
    }

    fn insert_adjacent(&mut self, selector: &str, value: &Value, offset: usize) -> Result<()> {
        let mut paths = hit_paths(self, selector)?;
        paths.sort();
        for path in paths.iter().rev() {
            if path.is_empty() {
                return Err(edit_error("Cannot add something next to root element."));
            }
            let (last, parent_path) = split_last(path);
            let Step::Child(index) = last else {
                return Err(edit_error("Cannot insert next to an attribute value."));
            };
            let Some(parent) = resolve_mut(self, parent_path).and_then(Value::as_node_mut)
            else {
                return Err(edit_error("Cannot insert a child into something but a node."));
            };
            parent.children.insert(index + offset, value.clone());
        }
        Ok(())
    }
}

/// Split a non-empty path into its final step and the path to the parent.
fn split_last(path: &[Step]) -> (Step, &[Step]) {
    let (parent, last) = path.split_at(path.len() - 1);
    (last[0], parent)
}
