use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::ir::{FamilyGraph, Gender, Person};

use super::index::RelationshipIndex;
use super::markers::{infer_couples, union_markers};
use super::types::{LayoutMode, LevelMap, PositionMap};

/// Slack for float noise when comparing distances against the branch gap.
const GAP_EPSILON: f32 = 1e-3;

/// Person and union-marker coordinates for a resolved level map.
pub fn compute_positions(
    graph: &FamilyGraph,
    levels: &LevelMap,
    root: &str,
    mode: LayoutMode,
    config: &LayoutConfig,
) -> PositionMap {
    let index = RelationshipIndex::build(&graph.relationships);
    let mut positions = place_persons(graph, &index, levels, root, mode, config);
    let couples = infer_couples(graph, &index, &positions);
    for marker in union_markers(&couples, &positions, config) {
        positions.insert(marker.id, (marker.x, marker.y));
    }
    positions
}

/// Persons sharing the same set of already-placed inward neighbors.
struct Group<'a> {
    key: Vec<String>,
    members: Vec<&'a Person>,
    anchor: f32,
}

/// Tier-by-tier placement of every reachable person, root at the origin.
pub(crate) fn place_persons(
    graph: &FamilyGraph,
    index: &RelationshipIndex,
    levels: &LevelMap,
    root: &str,
    mode: LayoutMode,
    config: &LayoutConfig,
) -> PositionMap {
    let mut positions = PositionMap::new();
    if !levels.is_reachable(root) {
        return positions;
    }
    positions.insert(root.to_string(), (0.0, 0.0));

    let mut tiers: BTreeMap<u32, Vec<&Person>> = BTreeMap::new();
    for person in &graph.persons {
        if person.id == root {
            continue;
        }
        if let Some(level) = levels.level(&person.id) {
            tiers.entry(level).or_default().push(person);
        }
    }

    let mut occupied: HashMap<u32, Vec<f32>> = HashMap::new();
    occupied.insert(0, vec![0.0]);

    for (level, members) in tiers {
        let y = mode.vertical_sign() * level as f32 * config.level_gap;
        let taken = occupied.entry(level).or_default();

        let mut grouped: BTreeMap<Vec<String>, Vec<&Person>> = BTreeMap::new();
        let mut isolated: Vec<&Person> = Vec::new();
        for person in members {
            let key = placed_neighbors(mode.inward(index, &person.id), &positions);
            if key.is_empty() {
                isolated.push(person);
            } else {
                grouped.entry(key).or_default().push(person);
            }
        }

        let mut groups: Vec<Group> = grouped
            .into_iter()
            .map(|(key, members)| {
                let anchor = key
                    .iter()
                    .filter_map(|id| positions.get(id))
                    .map(|(x, _)| *x)
                    .sum::<f32>()
                    / key.len() as f32;
                Group {
                    key,
                    members,
                    anchor,
                }
            })
            .collect();
        groups.sort_by(|a, b| {
            a.anchor
                .total_cmp(&b.anchor)
                .then_with(|| a.key.cmp(&b.key))
        });

        let spread = config.spread_at(level);
        let center_rank = (groups.len().saturating_sub(1)) as f32 / 2.0;
        for (rank, group) in groups.iter_mut().enumerate() {
            let center = group.anchor + (rank as f32 - center_rank) * spread;
            order_members(&mut group.members);
            for (member, desired) in group
                .members
                .iter()
                .zip(group_slots(group.members.len(), center, config))
            {
                let x = free_slot(desired, taken, config.branch_gap);
                taken.push(x);
                positions.insert(member.id.clone(), (x, y));
            }
        }

        for person in isolated {
            tracing::debug!(id = %person.id, level, "no placed neighbor; centering");
            let x = free_slot(0.0, taken, config.branch_gap);
            taken.push(x);
            positions.insert(person.id.clone(), (x, y));
        }
    }

    positions
}

fn placed_neighbors(neighbors: &[String], positions: &PositionMap) -> Vec<String> {
    let mut key: Vec<String> = neighbors
        .iter()
        .filter(|id| positions.contains_key(id.as_str()))
        .cloned()
        .collect();
    key.sort();
    key.dedup();
    key
}

/// Couples read male-left, female-right; anything else sorts between and
/// ties fall back to the id. Larger groups keep input order.
fn order_members(members: &mut [&Person]) {
    if members.len() != 2 {
        return;
    }
    members.sort_by(|a, b| match gender_rank(a).cmp(&gender_rank(b)) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
}

fn gender_rank(person: &Person) -> u8 {
    match person.gender() {
        Some(Gender::Male) => 0,
        Some(Gender::Other) | None => 1,
        Some(Gender::Female) => 2,
    }
}

/// Desired x for each member of a group centered on `center`.
fn group_slots(count: usize, center: f32, config: &LayoutConfig) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![center],
        2 => {
            let half = config.couple_gap / 2.0;
            vec![center - half, center + half]
        }
        _ => {
            let span = (count - 1) as f32 * config.branch_gap;
            let start = center - span / 2.0;
            (0..count)
                .map(|idx| start + idx as f32 * config.branch_gap)
                .collect()
        }
    }
}

/// Nearest x to `desired` that keeps `gap` from every taken slot, searching
/// outward in gap-sized steps (right before left on equal distance).
pub(crate) fn free_slot(desired: f32, taken: &[f32], gap: f32) -> f32 {
    let clear = |x: f32| taken.iter().all(|t| (t - x).abs() >= gap - GAP_EPSILON);
    if clear(desired) {
        return desired;
    }
    // Each taken slot blocks at most two candidates, so this range always
    // contains a free one.
    for step in 1..=taken.len() + 1 {
        let offset = step as f32 * gap;
        if clear(desired + offset) {
            return desired + offset;
        }
        if clear(desired - offset) {
            return desired - offset;
        }
    }
    taken.iter().copied().fold(desired, f32::max) + gap
}
