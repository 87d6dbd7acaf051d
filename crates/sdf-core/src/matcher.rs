//! Selector evaluation over a document.
//!
//! A selector is a `/`-separated list of levels; an absolute selector starts
//! with `/` and anchors at the document root, a relative one is rewritten to
//! `/*/selector` so it can start anywhere. Each level's conditions must all
//! hold for an element; `*` and `+` levels descend an arbitrary number of
//! hops (zero or more, one or more).
//!
//! Evaluation walks the prebuilt [`MatchView`] so every hit carries a stable
//! canonical path, and duplicates arising from overlapping wildcard routes
//! collapse to the first occurrence.

use std::collections::HashSet;

use crate::condition::{self, Condition};
use crate::error::{Result, SdfError};
use crate::value::Value;
use crate::view::{MatchId, MatchView, Matches, ROOT};

/// One `/`-separated segment of a selector with its parsed conditions.
#[derive(Debug, Clone)]
struct Level {
    conditions: Vec<Condition>,
}

impl Level {
    fn parse(text: &str) -> Result<Level> {
        let conditions = condition::parse_level(text)?;
        let wildcards = conditions
            .iter()
            .filter(|c| matches!(c, Condition::Hierarchy { .. }))
            .count();
        if wildcards > 1 {
            return Err(SdfError::Selector(
                "Cannot have multiple arbitrary node hierarchy conditions (* or +) \
                 at the same hierarchy level."
                    .into(),
            ));
        }
        Ok(Level { conditions })
    }

    fn hierarchy(&self) -> Option<bool> {
        self.conditions.iter().find_map(|c| match c {
            Condition::Hierarchy { at_least_one } => Some(*at_least_one),
            _ => None,
        })
    }

    /// A copy with `+` demoted to `*`, used once the wildcard has consumed
    /// its mandatory first hop.
    fn demoted(&self) -> Level {
        let conditions = self
            .conditions
            .iter()
            .map(|c| match c {
                Condition::Hierarchy { .. } => Condition::Hierarchy {
                    at_least_one: false,
                },
                other => other.clone(),
            })
            .collect();
        Level { conditions }
    }

    /// All non-wildcard conditions hold for the element in its context.
    fn satisfied_by(
        &self,
        value: &Value,
        parent: Option<&Value>,
        attribute_name: Option<&str>,
        child_index: Option<usize>,
    ) -> bool {
        self.conditions.iter().all(|c| {
            matches!(c, Condition::Hierarchy { .. })
                || c.matches(value, parent, attribute_name, child_index)
        })
    }
}

fn parse_selector(selector: &str) -> Result<Vec<Level>> {
    // an empty selector has no levels and anchors at the root
    if selector.is_empty() {
        return Ok(Vec::new());
    }
    let absolute;
    let rewritten;
    let text = if selector.starts_with('/') {
        absolute = selector;
        absolute
    } else {
        rewritten = format!("/*/{selector}");
        &rewritten
    };
    text.split('/').skip(1).map(Level::parse).collect()
}

/// Find every element of `document` matched by `selector`. Results come back
/// in first-discovery order with duplicates removed; an empty result is not
/// an error.
pub fn find<'a>(document: &'a Value, selector: &str) -> Result<Matches<'a>> {
    let levels = parse_selector(selector)?;
    let view = MatchView::build(document);

    let mut hits = Vec::new();
    let mut seen = HashSet::new();
    collect(&view, ROOT, None, &levels, &mut hits, &mut seen);

    Ok(Matches::new(view, hits))
}

/// Try to match `levels` starting at `id`, pushing hits in discovery order.
/// `attribute_name` is the key `id` hangs off its parent by, if any.
fn collect<'a>(
    view: &MatchView<'a>,
    id: MatchId,
    attribute_name: Option<&str>,
    levels: &[Level],
    hits: &mut Vec<MatchId>,
    seen: &mut HashSet<MatchId>,
) {
    // every level consumed: the current element is a hit
    let Some((level, rest)) = levels.split_first() else {
        if seen.insert(id) {
            hits.push(id);
        }
        return;
    };

    let value = view.value(id);
    let parent = view.parent(id).map(|p| view.value(p));
    let child_index = view.child_index(id);
    let hierarchy = level.hierarchy();

    // a zero-or-more wildcard may skip this level entirely
    if hierarchy == Some(false) {
        collect(view, id, attribute_name, rest, hits, seen);
    }

    if !level.satisfied_by(value, parent, attribute_name, child_index) {
        return;
    }

    if rest.is_empty() && hierarchy != Some(true) && seen.insert(id) {
        hits.push(id);
    }

    // descend: a wildcard level keeps itself alive (demoted), every level
    // also hands off to the remaining selector
    let next_levels: Vec<Vec<Level>> = if hierarchy.is_some() {
        let mut kept = vec![level.demoted()];
        kept.extend(rest.iter().cloned());
        vec![kept, rest.to_vec()]
    } else {
        vec![rest.to_vec()]
    };

    for next in &next_levels {
        if next.is_empty() {
            continue;
        }
        for child in view.children(id) {
            collect(view, *child, None, next, hits, seen);
        }
        for (key, attr) in view.attributes(id) {
            collect(view, *attr, Some(key.as_str()), next, hits, seen);
        }
    }
}
