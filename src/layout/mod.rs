mod decor;
mod edges;
mod error;
mod index;
mod levels;
mod markers;
mod position;
mod ranking;
mod root;
pub(crate) mod types;
pub use types::*;

pub use decor::{decoration_for, id_hash};
pub use edges::{compute_edges, stroke_width};
pub use error::LayoutError;
pub use index::RelationshipIndex;
pub use levels::assign_levels;
pub use markers::{Couple, infer_couples, union_markers};
pub use position::compute_positions;
pub use root::resolve_root;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::ir::FamilyGraph;

/// Who the layout is drawn around and in which direction it grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutRequest {
    pub mode: LayoutMode,
    pub root_id: Option<String>,
    /// Identity key (email) of the viewer, used when no explicit root is given.
    pub identity_hint: Option<String>,
}

impl LayoutRequest {
    pub fn new(mode: LayoutMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_root(mut self, root_id: impl Into<String>) -> Self {
        self.root_id = Some(root_id.into());
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity_hint = Some(identity.into());
        self
    }
}

/// Runs the whole pipeline on one graph snapshot: index, root, levels,
/// positions, union markers and edges.
pub fn compute_layout(
    graph: &FamilyGraph,
    request: &LayoutRequest,
    config: &LayoutConfig,
) -> Result<Layout, LayoutError> {
    let root_id = resolve_root(
        &graph.persons,
        &graph.relationships,
        request.identity_hint.as_deref(),
        request.root_id.as_deref(),
    )?;
    let mode = request.mode;
    tracing::debug!(root = %root_id, ?mode, persons = graph.persons.len(), "layout start");

    let index = RelationshipIndex::build(&graph.relationships);
    let levels = levels::assign_levels_with_index(graph, &index, &root_id, mode);
    let mut positions = position::place_persons(graph, &index, &levels, &root_id, mode, config);
    tracing::debug!(placed = positions.len(), "positions solved");

    let mut nodes: BTreeMap<String, NodeLayout> = BTreeMap::new();
    for person in &graph.persons {
        let Some(&(x, y)) = positions.get(&person.id) else {
            continue;
        };
        nodes.insert(
            person.id.clone(),
            NodeLayout {
                id: person.id.clone(),
                kind: NodeKind::Person,
                x,
                y,
                width: config.node_width,
                height: config.node_height,
                level: levels.level(&person.id),
                is_root: person.id == root_id,
                decoration: Some(decoration_for(&person.id)),
                partners: Vec::new(),
            },
        );
    }

    let couples = infer_couples(graph, &index, &positions);
    for marker in union_markers(&couples, &positions, config) {
        positions.insert(marker.id.clone(), (marker.x, marker.y));
        nodes.insert(marker.id.clone(), marker);
    }
    tracing::debug!(couples = couples.len(), "union markers placed");

    let edges = compute_edges(graph, &levels, &positions, mode, config);
    tracing::debug!(edges = edges.len(), "edges routed");

    let (min_x, min_y, width, height) = bounds(&nodes);
    Ok(Layout {
        root_id,
        mode,
        levels,
        nodes,
        edges,
        min_x,
        min_y,
        width,
        height,
    })
}

/// Bounding box over node extents as `(min_x, min_y, width, height)`.
fn bounds(nodes: &BTreeMap<String, NodeLayout>) -> (f32, f32, f32, f32) {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for node in nodes.values() {
        min_x = min_x.min(node.x - node.width / 2.0);
        min_y = min_y.min(node.y - node.height / 2.0);
        max_x = max_x.max(node.x + node.width / 2.0);
        max_y = max_y.max(node.y + node.height / 2.0);
    }
    if min_x == f32::MAX {
        return (0.0, 0.0, 0.0, 0.0);
    }
    (min_x, min_y, max_x - min_x, max_y - min_y)
}
