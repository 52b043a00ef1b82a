use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Topological order of a traversal's reachable subgraph.
///
/// Edges that point backwards in the order close a cycle and are ignored by
/// every pass that walks this order.
#[derive(Debug, Clone, Default)]
pub(super) struct TraversalOrder {
    pub order: Vec<String>,
    position: HashMap<String, usize>,
    pub back_edges: usize,
}

impl TraversalOrder {
    pub fn is_forward(&self, from: &str, to: &str) -> bool {
        match (self.position.get(from), self.position.get(to)) {
            (Some(from_idx), Some(to_idx)) => to_idx > from_idx,
            _ => false,
        }
    }
}

/// Kahn's algorithm over `node_ids` (discovery order, root first). When every
/// remaining node still has an unprocessed predecessor the earliest-discovered
/// one is taken as the next source, treating its incoming edges as back-edges.
pub(super) fn traversal_order<'a, F>(node_ids: &[String], neighbors: F) -> TraversalOrder
where
    F: Fn(&str) -> &'a [String],
{
    let discovery: HashMap<&str, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();

    let mut indeg: HashMap<&str, usize> = discovery.keys().map(|id| (*id, 0)).collect();
    for id in node_ids {
        for next in neighbors(id.as_str()) {
            if let Some(deg) = indeg.get_mut(next.as_str()) {
                *deg += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for id in node_ids {
        if indeg.get(id.as_str()).copied().unwrap_or(0) == 0 {
            ready.push(Reverse((discovery[id.as_str()], id.as_str())));
        }
    }

    let mut order: Vec<String> = Vec::with_capacity(node_ids.len());
    let mut processed: HashSet<&str> = HashSet::new();
    loop {
        while let Some(Reverse((_key, id))) = ready.pop() {
            if !processed.insert(id) {
                continue;
            }
            order.push(id.to_string());
            for next in neighbors(id) {
                if processed.contains(next.as_str()) {
                    continue;
                }
                if let Some(deg) = indeg.get_mut(next.as_str()) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        ready.push(Reverse((discovery[next.as_str()], next.as_str())));
                    }
                }
            }
        }

        if processed.len() >= node_ids.len() {
            break;
        }

        let stuck = node_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !processed.contains(id))
            .min_by_key(|id| discovery[id]);
        match stuck {
            Some(id) => ready.push(Reverse((discovery[id], id))),
            None => break,
        }
    }

    let position: HashMap<String, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect();

    let mut back_edges = 0;
    for id in &order {
        for next in neighbors(id.as_str()) {
            if let (Some(from_idx), Some(to_idx)) = (position.get(id), position.get(next))
                && to_idx <= from_idx
            {
                back_edges += 1;
            }
        }
    }

    TraversalOrder {
        order,
        position,
        back_edges,
    }
}
