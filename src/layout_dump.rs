use crate::ir::FamilyGraph;
use crate::kinship::{full_name, life_years};
use crate::layout::{Decoration, Layout, LayoutMode, NodeKind};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// The render-ready `{nodes, edges}` contract handed to drawing surfaces.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub root_id: String,
    pub mode: LayoutMode,
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub unreachable: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    pub is_root: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoration: Option<Decoration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partners: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub stroke_width: f32,
    pub points: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, graph: &FamilyGraph) -> Self {
        let nodes = layout
            .nodes
            .values()
            .map(|node| {
                let person = match node.kind {
                    NodeKind::Person => graph.person(&node.id),
                    NodeKind::Union => None,
                };
                NodeDump {
                    id: node.id.clone(),
                    kind: node.kind,
                    x: node.x,
                    y: node.y,
                    width: node.width,
                    height: node.height,
                    level: node.level,
                    is_root: node.is_root,
                    decoration: node.decoration,
                    label: person.map(full_name),
                    years: person.map(life_years).filter(|years| !years.is_empty()),
                    partners: node.partners.clone(),
                }
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                source: edge.from.clone(),
                target: edge.to.clone(),
                stroke_width: edge.stroke_width,
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        LayoutDump {
            root_id: layout.root_id.clone(),
            mode: layout.mode,
            min_x: layout.min_x,
            min_y: layout.min_y,
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
            unreachable: layout.levels.unreachable().map(str::to_string).collect(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout, graph: &FamilyGraph) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, graph);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

pub fn layout_dump_json(layout: &Layout, graph: &FamilyGraph) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&LayoutDump::from_layout(layout, graph))?)
}
