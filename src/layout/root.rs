use std::collections::{HashMap, HashSet};

use crate::ir::{Person, Relationship};

use super::error::LayoutError;
use super::index::RelationshipIndex;

/// Picks the person the layout is drawn relative to.
///
/// An explicit root wins when it names a known person, then the person whose
/// identity key matches the hint. Otherwise the most-descended person (the
/// longest chain of ancestors above them) is taken as the subject of the tree,
/// ties going to the earliest person in input order.
pub fn resolve_root(
    persons: &[Person],
    relationships: &[Relationship],
    identity_hint: Option<&str>,
    explicit_root: Option<&str>,
) -> Result<String, LayoutError> {
    if persons.is_empty() {
        return Err(LayoutError::EmptyGraph);
    }

    if let Some(root) = explicit_root {
        if persons.iter().any(|person| person.id == root) {
            return Ok(root.to_string());
        }
        tracing::debug!(root, "explicit root not in graph, falling back");
    }

    if let Some(hint) = identity_hint
        && let Some(person) = persons
            .iter()
            .find(|person| person.identity_key() == Some(hint))
    {
        return Ok(person.id.clone());
    }

    let index = RelationshipIndex::build(relationships);
    let mut memo: HashMap<String, usize> = HashMap::new();
    let mut best: Option<(&str, usize)> = None;
    for person in persons {
        let mut path = HashSet::new();
        let (depth, _) = ancestor_chain_len(&person.id, &index, &mut path, &mut memo);
        if best.is_none_or(|(_, best_depth)| depth > best_depth) {
            best = Some((person.id.as_str(), depth));
        }
    }

    best.map(|(id, _)| id.to_string())
        .ok_or(LayoutError::EmptyGraph)
}

/// Length of the longest parent chain above `id`, and whether it is final.
/// Parents already on the current walk are cycle members and contribute
/// nothing; a depth cut short that way depends on the walk, so it is not
/// memoized.
fn ancestor_chain_len(
    id: &str,
    index: &RelationshipIndex,
    path: &mut HashSet<String>,
    memo: &mut HashMap<String, usize>,
) -> (usize, bool) {
    if let Some(depth) = memo.get(id) {
        return (*depth, true);
    }
    path.insert(id.to_string());
    let mut depth = 0;
    let mut complete = true;
    for parent in index.parents_of(id) {
        if path.contains(parent) {
            complete = false;
            continue;
        }
        let (parent_depth, parent_complete) = ancestor_chain_len(parent, index, path, memo);
        complete &= parent_complete;
        depth = depth.max(parent_depth + 1);
    }
    path.remove(id);
    if complete {
        memo.insert(id.to_string(), depth);
    }
    (depth, complete)
}
