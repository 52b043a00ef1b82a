use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which side of the root the tree grows towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Follow child→parent links upwards; ancestors render above the root.
    #[default]
    Ancestors,
    /// Follow parent→child links downwards; descendants render below the root.
    Descendants,
}

impl LayoutMode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "ancestors" | "up" => Some(Self::Ancestors),
            "descendants" | "down" => Some(Self::Descendants),
            _ => None,
        }
    }

    /// Screen-space direction of increasing generation (SVG y grows downwards).
    pub fn vertical_sign(self) -> f32 {
        match self {
            Self::Ancestors => -1.0,
            Self::Descendants => 1.0,
        }
    }
}

/// Generation offset of a person relative to the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "level")]
pub enum Generation {
    Reachable(u32),
    /// Not connected to the root in the traversal direction; excluded from geometry.
    Unreachable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelMap {
    entries: BTreeMap<String, Generation>,
}

impl LevelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: &str, generation: Generation) {
        self.entries.insert(id.to_string(), generation);
    }

    pub fn generation(&self, id: &str) -> Generation {
        self.entries
            .get(id)
            .copied()
            .unwrap_or(Generation::Unreachable)
    }

    pub fn level(&self, id: &str) -> Option<u32> {
        match self.generation(id) {
            Generation::Reachable(level) => Some(level),
            Generation::Unreachable => None,
        }
    }

    pub fn is_reachable(&self, id: &str) -> bool {
        self.level(id).is_some()
    }

    /// Reachable persons ordered by id.
    pub fn reachable(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().filter_map(|(id, generation)| match generation {
            Generation::Reachable(level) => Some((id.as_str(), *level)),
            Generation::Unreachable => None,
        })
    }

    pub fn unreachable(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, generation)| **generation == Generation::Unreachable)
            .map(|(id, _)| id.as_str())
    }

    pub fn max_level(&self) -> u32 {
        self.reachable().map(|(_, level)| level).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub type PositionMap = BTreeMap<String, (f32, f32)>;

/// Cosmetic per-person variation; a pure function of the person id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    pub rotation_deg: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Person,
    /// Decorative ring between two co-parents; not part of the graph.
    Union,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub kind: NodeKind,
    /// Center of the node.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub level: Option<u32>,
    pub is_root: bool,
    pub decoration: Option<Decoration>,
    /// Persons a union marker joins; empty for person nodes.
    pub partners: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub id: String,
    pub from: String,
    pub to: String,
    pub stroke_width: f32,
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub root_id: String,
    pub mode: LayoutMode,
    pub levels: LevelMap,
    pub nodes: BTreeMap<String, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn person_nodes(&self) -> impl Iterator<Item = &NodeLayout> {
        self.nodes
            .values()
            .filter(|node| node.kind == NodeKind::Person)
    }

    pub fn union_nodes(&self) -> impl Iterator<Item = &NodeLayout> {
        self.nodes
            .values()
            .filter(|node| node.kind == NodeKind::Union)
    }

    pub fn positions(&self) -> PositionMap {
        self.nodes
            .iter()
            .map(|(id, node)| (id.clone(), (node.x, node.y)))
            .collect()
    }
}
