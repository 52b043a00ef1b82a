use std::collections::BTreeSet;

use crate::config::LayoutConfig;
use crate::ir::FamilyGraph;

use super::index::RelationshipIndex;
use super::types::{NodeKind, NodeLayout, PositionMap};

/// Two placed persons who share a child; `first < second` by id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Couple {
    pub first: String,
    pub second: String,
}

impl Couple {
    fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn marker_ids(&self) -> [String; 2] {
        let base = format!("union:{}+{}", self.first, self.second);
        [format!("{base}:left"), format!("{base}:right")]
    }
}

/// Pairs of positioned co-parents. Parents recorded with the same gender are
/// not treated as a couple; a missing gender on either side is.
pub fn infer_couples(
    graph: &FamilyGraph,
    index: &RelationshipIndex,
    positions: &PositionMap,
) -> BTreeSet<Couple> {
    let mut couples = BTreeSet::new();
    for child in index.children_with_parents() {
        let parents: Vec<&str> = index
            .parents_of(child)
            .iter()
            .map(String::as_str)
            .filter(|id| positions.contains_key(*id))
            .collect();
        for (idx, a) in parents.iter().enumerate() {
            for b in &parents[idx + 1..] {
                let gender_a = graph.person(a).and_then(|p| p.gender());
                let gender_b = graph.person(b).and_then(|p| p.gender());
                if gender_a.is_some() && gender_a == gender_b {
                    continue;
                }
                couples.insert(Couple::new(a, b));
            }
        }
    }
    couples
}

/// Two overlapping rings centered between each couple and dropped slightly
/// below them.
pub fn union_markers(
    couples: &BTreeSet<Couple>,
    positions: &PositionMap,
    config: &LayoutConfig,
) -> Vec<NodeLayout> {
    let size = config.union_marker_size;
    let shift = size * config.union_marker_overlap;
    let mut markers = Vec::with_capacity(couples.len() * 2);
    for couple in couples {
        let (Some(a), Some(b)) = (positions.get(&couple.first), positions.get(&couple.second)) else {
            continue;
        };
        let mid_x = (a.0 + b.0) / 2.0;
        let y = (a.1 + b.1) / 2.0 + config.union_marker_drop;
        let [left_id, right_id] = couple.marker_ids();
        for (id, x) in [(left_id, mid_x - shift), (right_id, mid_x + shift)] {
            markers.push(NodeLayout {
                id,
                kind: NodeKind::Union,
                x,
                y,
                width: size,
                height: size,
                level: None,
                is_root: false,
                decoration: None,
                partners: vec![couple.first.clone(), couple.second.clone()],
            });
        }
    }
    markers
}
