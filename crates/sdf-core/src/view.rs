//! Decorated read-only view over a [`Value`] tree.
//!
//! A [`MatchView`] is an arena holding one entry per tree position, built
//! top-down in one pass and immutable afterwards. Every traversal that
//! reaches an element goes through the same arena entry, so an entry id is
//! equivalent to "same tree position" — the matcher relies on that for
//! deduplication. Each entry carries a parent back-reference (an index, so no
//! ownership cycles) and a canonical path string.
//!
//! Path strings: the document root is `/`; descendants extend their parent
//! with `/name` (plus `#index` when the parent has more than one child),
//! bare `/#index` for literal children, and `/@key` for attribute values.

use crate::value::Value;

pub(crate) type MatchId = usize;

/// How an element hangs off its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Step {
    /// Position in the parent's child list.
    Child(usize),
    /// Position in the parent's attribute list.
    Attribute(usize),
}

#[derive(Debug)]
struct MatchEntry<'a> {
    value: &'a Value,
    path: String,
    parent: Option<MatchId>,
    step: Option<Step>,
    children: Vec<MatchId>,
    attributes: Vec<(String, MatchId)>,
}

/// Arena of [`MatchEntry`]s for one document, built once per query or
/// validation call and discarded afterwards.
#[derive(Debug)]
pub struct MatchView<'a> {
    entries: Vec<MatchEntry<'a>>,
}

pub(crate) const ROOT: MatchId = 0;

impl<'a> MatchView<'a> {
    /// Build the full view for a document.
    pub fn build(root: &'a Value) -> Self {
        let mut view = MatchView {
            entries: Vec::new(),
        };
        view.add(root, "/".to_string(), None, None);
        view
    }

    fn add(
        &mut self,
        value: &'a Value,
        path: String,
        parent: Option<MatchId>,
        step: Option<Step>,
    ) -> MatchId {
        // Children paths extend the parent's path, except that the root
        // contributes "/name" rather than its own display path "/".
        let base = match (&parent, value) {
            (None, Value::Node(n)) => format!("/{}", n.name),
            _ => path.clone(),
        };

        let id = self.entries.len();
        self.entries.push(MatchEntry {
            value,
            path,
            parent,
            step,
            children: Vec::new(),
            attributes: Vec::new(),
        });

        if let Value::Node(n) = value {
            let multiple = n.children.len() > 1;
            for (i, child) in n.children.iter().enumerate() {
                let segment = match child {
                    Value::Node(c) if multiple => format!("{}#{i}", c.name),
                    Value::Node(c) => c.name.clone(),
                    _ => format!("#{i}"),
                };
                let child_id = self.add(
                    child,
                    format!("{base}/{segment}"),
                    Some(id),
                    Some(Step::Child(i)),
                );
                self.entries[id].children.push(child_id);
            }
            for (i, (key, attr_value)) in n.attributes().iter().enumerate() {
                let attr_id = self.add(
                    attr_value,
                    format!("{base}/@{key}"),
                    Some(id),
                    Some(Step::Attribute(i)),
                );
                self.entries[id].attributes.push((key.clone(), attr_id));
            }
        }

        id
    }

    pub(crate) fn value(&self, id: MatchId) -> &'a Value {
        self.entries[id].value
    }

    pub(crate) fn path(&self, id: MatchId) -> &str {
        &self.entries[id].path
    }

    pub(crate) fn parent(&self, id: MatchId) -> Option<MatchId> {
        self.entries[id].parent
    }

    /// The element's position in its parent's child list, if it was reached
    /// as a child (not an attribute, not the root).
    pub(crate) fn child_index(&self, id: MatchId) -> Option<usize> {
        match self.entries[id].step {
            Some(Step::Child(i)) => Some(i),
            _ => None,
        }
    }

    pub(crate) fn children(&self, id: MatchId) -> &[MatchId] {
        &self.entries[id].children
    }

    pub(crate) fn attributes(&self, id: MatchId) -> &[(String, MatchId)] {
        &self.entries[id].attributes
    }

    pub(crate) fn attribute(&self, id: MatchId, name: &str) -> Option<MatchId> {
        self.entries[id]
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, attr_id)| *attr_id)
    }

    /// Locate an entry as a step sequence from the root, for edits applied
    /// after the view is gone.
    pub(crate) fn steps(&self, id: MatchId) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut current = id;
        loop {
            let entry = &self.entries[current];
            match (&entry.step, entry.parent) {
                (Some(step), Some(parent)) => {
                    steps.push(*step);
                    current = parent;
                }
                _ => break,
            }
        }
        steps.reverse();
        steps
    }
}

/// Result set of a path query: the view it was computed over plus the
/// matching positions, deduplicated, in first-discovery order.
#[derive(Debug)]
pub struct Matches<'a> {
    view: MatchView<'a>,
    hits: Vec<MatchId>,
}

impl<'a> Matches<'a> {
    pub(crate) fn new(view: MatchView<'a>, hits: Vec<MatchId>) -> Self {
        Matches { view, hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Match<'_, 'a>> {
        self.hits.get(index).map(|&id| Match {
            view: &self.view,
            id,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Match<'_, 'a>> {
        self.hits.iter().map(|&id| Match {
            view: &self.view,
            id,
        })
    }

    /// Canonical paths of all matches.
    pub fn paths(&self) -> Vec<&str> {
        self.hits.iter().map(|&id| self.view.path(id)).collect()
    }

    pub(crate) fn view(&self) -> &MatchView<'a> {
        &self.view
    }

    pub(crate) fn ids(&self) -> &[MatchId] {
        &self.hits
    }
}

/// One matched tree position: the element itself, its canonical path and its
/// parent chain. Borrowed from a [`Matches`] result set.
#[derive(Debug, Clone, Copy)]
pub struct Match<'m, 'a> {
    view: &'m MatchView<'a>,
    id: MatchId,
}

impl<'m, 'a> Match<'m, 'a> {
    /// The matched element inside the original document.
    pub fn value(&self) -> &'a Value {
        self.view.value(self.id)
    }

    /// Canonical path of this position; re-parsing it as a selector matches
    /// this element again.
    pub fn path(&self) -> &'m str {
        self.view.path(self.id)
    }

    /// Enclosing element, or `None` for the document root.
    pub fn parent(&self) -> Option<Match<'m, 'a>> {
        self.view.parent(self.id).map(|id| Match {
            view: self.view,
            id,
        })
    }

    /// Child positions, for node elements.
    pub fn children(&self) -> Vec<Match<'m, 'a>> {
        self.view
            .children(self.id)
            .iter()
            .map(|&id| Match {
                view: self.view,
                id,
            })
            .collect()
    }

    /// Attribute-value position reached through the given key.
    pub fn attribute(&self, name: &str) -> Option<Match<'m, 'a>> {
        self.view.attribute(self.id, name).map(|id| Match {
            view: self.view,
            id,
        })
    }
}

impl PartialEq for Match<'_, '_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.view, other.view)
    }
}
