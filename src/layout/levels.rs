use std::collections::{HashMap, HashSet, VecDeque};

use crate::ir::FamilyGraph;

use super::index::RelationshipIndex;
use super::ranking::{TraversalOrder, traversal_order};
use super::types::{Generation, LayoutMode, LevelMap};

/// How a BFS treats a person reached a second time at a different depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DepthPolicy {
    /// Keep the largest depth seen.
    Deepest,
    /// Keep the first (closest) depth.
    Closest,
}

impl LayoutMode {
    /// Neighbors one generation further from the root.
    pub(crate) fn outward<'a>(self, index: &'a RelationshipIndex, id: &str) -> &'a [String] {
        match self {
            Self::Ancestors => index.parents_of(id),
            Self::Descendants => index.children_of(id),
        }
    }

    /// Neighbors one generation closer to the root.
    pub(crate) fn inward<'a>(self, index: &'a RelationshipIndex, id: &str) -> &'a [String] {
        match self {
            Self::Ancestors => index.children_of(id),
            Self::Descendants => index.parents_of(id),
        }
    }

    fn depth_policy(self) -> DepthPolicy {
        match self {
            Self::Ancestors => DepthPolicy::Deepest,
            Self::Descendants => DepthPolicy::Closest,
        }
    }
}

pub fn assign_levels(graph: &FamilyGraph, root: &str, mode: LayoutMode) -> LevelMap {
    let index = RelationshipIndex::build(&graph.relationships);
    assign_levels_with_index(graph, &index, root, mode)
}

pub(crate) fn assign_levels_with_index(
    graph: &FamilyGraph,
    index: &RelationshipIndex,
    root: &str,
    mode: LayoutMode,
) -> LevelMap {
    let mut map = LevelMap::new();
    for person in &graph.persons {
        map.set(&person.id, Generation::Unreachable);
    }
    if !graph.contains(root) {
        tracing::warn!(root, "root is not part of the graph; nothing is reachable");
        return map;
    }

    let known: HashSet<&str> = graph.persons.iter().map(|p| p.id.as_str()).collect();
    let outward = |id: &str| mode.outward(index, id);

    let (discovered, mut levels) = breadth_first(root, &known, mode.depth_policy(), outward);
    let order = traversal_order(&discovered, outward);
    if order.back_edges > 0 {
        tracing::warn!(
            back_edges = order.back_edges,
            "relationship cycle reachable from root; ignoring back edges"
        );
    }
    relax(&order, &mut levels, outward);

    if mode == LayoutMode::Ancestors {
        let max_rounds = graph.persons.len().saturating_mul(2).max(1);
        align_co_parents(index, root, &order, &mut levels, max_rounds);
    }

    for (id, level) in levels {
        map.set(&id, Generation::Reachable(level));
    }
    tracing::debug!(
        ?mode,
        reachable = discovered.len(),
        total = graph.persons.len(),
        "levels assigned"
    );
    map
}

/// One BFS for both modes; `outward` supplies the edge direction.
fn breadth_first<'a, F>(
    root: &str,
    known: &HashSet<&str>,
    policy: DepthPolicy,
    outward: F,
) -> (Vec<String>, HashMap<String, u32>)
where
    F: Fn(&str) -> &'a [String],
{
    let mut levels: HashMap<String, u32> = HashMap::new();
    let mut discovered = vec![root.to_string()];
    let mut queue = VecDeque::from([root.to_string()]);
    levels.insert(root.to_string(), 0);

    while let Some(current) = queue.pop_front() {
        let next_level = levels.get(&current).copied().unwrap_or(0) + 1;
        for next in outward(current.as_str()) {
            if !known.contains(next.as_str()) {
                continue;
            }
            match levels.get_mut(next) {
                None => {
                    levels.insert(next.clone(), next_level);
                    discovered.push(next.clone());
                    queue.push_back(next.clone());
                }
                Some(existing) => {
                    if policy == DepthPolicy::Deepest && next != root && *existing < next_level {
                        *existing = next_level;
                    }
                }
            }
        }
    }

    (discovered, levels)
}

/// Pushes every person at least one generation past each forward neighbor.
/// A single pass in topological order reaches the fixed point.
fn relax<'a, F>(order: &TraversalOrder, levels: &mut HashMap<String, u32>, outward: F)
where
    F: Fn(&str) -> &'a [String],
{
    for id in &order.order {
        let Some(level) = levels.get(id).copied() else {
            continue;
        };
        for next in outward(id.as_str()) {
            if !order.is_forward(id, next) {
                continue;
            }
            if let Some(existing) = levels.get_mut(next)
                && *existing <= level
            {
                *existing = level + 1;
            }
        }
    }
}

/// Lifts co-parents of every shared child onto one tier, then re-relaxes so
/// their own ancestors stay above them. Parent sets where one parent descends
/// from another can never share a tier and are left alone.
///
/// Levels only rise, so a consistent set of constraints is met without any
/// level passing `reachable - 1`. Crossing that ceiling (or the round limit)
/// means the constraints contradict each other, and the relaxed levels from
/// before alignment are restored.
fn align_co_parents(
    index: &RelationshipIndex,
    root: &str,
    order: &TraversalOrder,
    levels: &mut HashMap<String, u32>,
    max_rounds: usize,
) {
    let groups: Vec<Vec<&str>> = index
        .children_with_parents()
        .into_iter()
        .filter_map(|child| {
            let parents: Vec<&str> = index
                .parents_of(child)
                .iter()
                .map(String::as_str)
                .filter(|parent| levels.contains_key(*parent))
                .collect();
            (parents.len() >= 2 && !has_lineal_pair(index, &parents)).then_some(parents)
        })
        .collect();
    if groups.is_empty() {
        return;
    }

    let snapshot = levels.clone();
    let reachable_ceiling = u32::try_from(levels.len().saturating_sub(1)).unwrap_or(u32::MAX);
    let ceiling = snapshot
        .values()
        .copied()
        .max()
        .unwrap_or(0)
        .max(reachable_ceiling);
    let outward = |id: &str| index.parents_of(id);

    for round in 0..max_rounds {
        let mut changed = false;
        for parents in &groups {
            let target = parents
                .iter()
                .filter_map(|parent| levels.get(*parent).copied())
                .max()
                .unwrap_or(0);
            for parent in parents {
                if *parent == root {
                    continue;
                }
                if let Some(level) = levels.get_mut(*parent)
                    && *level < target
                {
                    *level = target;
                    changed = true;
                }
            }
        }
        if !changed {
            tracing::trace!(rounds = round, "co-parent alignment converged");
            return;
        }
        relax(order, levels, outward);
        if levels.values().any(|level| *level > ceiling) {
            tracing::warn!(round, ceiling, "contradictory co-parent alignment; keeping unaligned levels");
            *levels = snapshot;
            return;
        }
    }
    tracing::warn!(max_rounds, "co-parent alignment hit its round limit; keeping unaligned levels");
    *levels = snapshot;
}

/// Whether any parent in the set is an ancestor of another one.
fn has_lineal_pair(index: &RelationshipIndex, parents: &[&str]) -> bool {
    parents.iter().enumerate().any(|(idx, first)| {
        parents[idx + 1..]
            .iter()
            .any(|second| descends_from(index, first, second) || descends_from(index, second, first))
    })
}

fn descends_from(index: &RelationshipIndex, person: &str, ancestor: &str) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack = vec![person];
    while let Some(id) = stack.pop() {
        for parent in index.parents_of(id) {
            if parent == ancestor {
                return true;
            }
            if seen.insert(parent.as_str()) {
                stack.push(parent.as_str());
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Gender, Person, PersonData, Relationship};

    fn graph(ids: &[&str], rels: &[(&str, &str)]) -> FamilyGraph {
        FamilyGraph {
            persons: ids
                .iter()
                .map(|id| {
                    Person::new(
                        *id,
                        PersonData {
                            first_name: id.to_string(),
                            gender: Some(Gender::Other),
                            ..PersonData::default()
                        },
                    )
                })
                .collect(),
            relationships: rels
                .iter()
                .enumerate()
                .map(|(idx, (parent, child))| Relationship::new(format!("r{idx}"), *parent, *child))
                .collect(),
        }
    }

    #[test]
    fn parents_sit_one_level_above_root() {
        let g = graph(&["A", "B", "C"], &[("B", "A"), ("C", "A")]);
        let levels = assign_levels(&g, "A", LayoutMode::Ancestors);
        assert_eq!(levels.level("A"), Some(0));
        assert_eq!(levels.level("B"), Some(1));
        assert_eq!(levels.level("C"), Some(1));
    }

    #[test]
    fn persons_outside_the_direction_are_unreachable() {
        let g = graph(&["A", "B", "K", "X"], &[("B", "A"), ("A", "K")]);
        let up = assign_levels(&g, "A", LayoutMode::Ancestors);
        assert_eq!(up.generation("K"), Generation::Unreachable);
        assert_eq!(up.generation("X"), Generation::Unreachable);
        let down = assign_levels(&g, "A", LayoutMode::Descendants);
        assert_eq!(down.level("K"), Some(1));
        assert_eq!(down.generation("B"), Generation::Unreachable);
        assert_eq!(down.unreachable().collect::<Vec<_>>(), vec!["B", "X"]);
    }

    #[test]
    fn ancestors_keep_the_deepest_path() {
        // G is both grandparent (via P) and parent of root R.
        let g = graph(&["R", "P", "G"], &[("P", "R"), ("G", "P"), ("G", "R")]);
        let levels = assign_levels(&g, "R", LayoutMode::Ancestors);
        assert_eq!(levels.level("P"), Some(1));
        assert_eq!(levels.level("G"), Some(2));
    }

    #[test]
    fn descendants_stay_below_every_reachable_parent() {
        let g = graph(&["R", "A", "C"], &[("R", "A"), ("A", "C"), ("R", "C")]);
        let levels = assign_levels(&g, "R", LayoutMode::Descendants);
        assert_eq!(levels.level("A"), Some(1));
        assert_eq!(levels.level("C"), Some(2));
    }

    #[test]
    fn co_parents_are_aligned_and_lift_their_ancestors() {
        // P1 and P2 share child K but are reached through lines of different
        // length, so P1 starts a tier lower than P2.
        let g = graph(
            &["R", "A", "B", "P1", "C", "P2", "K", "P1P"],
            &[
                ("A", "R"),
                ("B", "R"),
                ("P1", "A"),
                ("C", "B"),
                ("P2", "C"),
                ("P1", "K"),
                ("P2", "K"),
                ("P1P", "P1"),
            ],
        );
        let levels = assign_levels(&g, "R", LayoutMode::Ancestors);
        assert_eq!(levels.level("P2"), Some(3));
        assert_eq!(levels.level("P1"), Some(3));
        assert_eq!(levels.level("P1P"), Some(4));
        assert_eq!(levels.level("A"), Some(1));
        assert!(!levels.is_reachable("K"));
    }

    #[test]
    fn aligned_couples_stay_put() {
        let g = graph(
            &["R", "F", "M", "GF", "GM", "GGF"],
            &[
                ("F", "R"),
                ("M", "R"),
                ("GF", "F"),
                ("GM", "F"),
                ("GGF", "GM"),
            ],
        );
        let levels = assign_levels(&g, "R", LayoutMode::Ancestors);
        assert_eq!(levels.level("GF"), levels.level("GM"));
        assert_eq!(levels.level("GGF"), Some(3));
    }

    #[test]
    fn two_cycle_terminates() {
        let g = graph(&["A", "B"], &[("A", "B"), ("B", "A")]);
        for mode in [LayoutMode::Ancestors, LayoutMode::Descendants] {
            let levels = assign_levels(&g, "A", mode);
            assert_eq!(levels.level("A"), Some(0));
            assert_eq!(levels.level("B"), Some(1));
        }
    }

    #[test]
    fn contradictory_alignment_still_terminates() {
        // Q is co-parent of P (via C) and also P's parent.
        let g = graph(&["C", "P", "Q"], &[("P", "C"), ("Q", "C"), ("Q", "P")]);
        let levels = assign_levels(&g, "C", LayoutMode::Ancestors);
        assert!(levels.is_reachable("P"));
        assert!(levels.is_reachable("Q"));
    }

    #[test]
    fn lineal_co_parents_do_not_inflate_levels() {
        // G is R's parent and also P's parent, so P and G can never align.
        let mut ids = vec!["R".to_string(), "P".to_string(), "G".to_string()];
        ids.extend((0..50).map(|k| format!("loose{k}")));
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        let g = graph(&ids, &[("P", "R"), ("G", "P"), ("G", "R")]);
        let levels = assign_levels(&g, "R", LayoutMode::Ancestors);
        assert_eq!(levels.level("P"), Some(1));
        assert_eq!(levels.level("G"), Some(2));
        assert_eq!(levels.max_level(), 2);
    }

    #[test]
    fn contradictory_co_parent_chain_keeps_relaxed_levels() {
        // X~Y and Y2~Z must align, but Y2 sits above X and Z sits below Y.
        let g = graph(
            &["R", "X", "Z", "Y", "Y2", "K1", "K2"],
            &[
                ("X", "R"),
                ("Z", "R"),
                ("Y", "Z"),
                ("Y2", "X"),
                ("X", "K1"),
                ("Y", "K1"),
                ("Y2", "K2"),
                ("Z", "K2"),
            ],
        );
        let levels = assign_levels(&g, "R", LayoutMode::Ancestors);
        assert_eq!(levels.level("X"), Some(1));
        assert_eq!(levels.level("Z"), Some(1));
        assert_eq!(levels.level("Y"), Some(2));
        assert_eq!(levels.level("Y2"), Some(2));
    }

    #[test]
    fn missing_root_leaves_everyone_unreachable() {
        let g = graph(&["A"], &[]);
        let levels = assign_levels(&g, "ghost", LayoutMode::Ancestors);
        assert_eq!(levels.len(), 1);
        assert!(!levels.is_reachable("A"));
    }
}
