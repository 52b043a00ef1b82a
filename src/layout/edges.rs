use crate::config::LayoutConfig;
use crate::ir::FamilyGraph;

use super::types::{EdgeLayout, LayoutMode, LevelMap, PositionMap};

/// One edge per relationship whose endpoints are both reachable, in
/// relationship order. Links to unreachable persons are dropped.
pub fn compute_edges(
    graph: &FamilyGraph,
    levels: &LevelMap,
    positions: &PositionMap,
    mode: LayoutMode,
    config: &LayoutConfig,
) -> Vec<EdgeLayout> {
    let mut edges = Vec::new();
    let mut skipped = 0usize;
    for rel in &graph.relationships {
        let (Some(_), Some(child_level)) = (levels.level(&rel.parent_id), levels.level(&rel.child_id))
        else {
            skipped += 1;
            continue;
        };
        let points = match (positions.get(&rel.parent_id), positions.get(&rel.child_id)) {
            (Some(from), Some(to)) => smooth_step(*from, *to),
            _ => Vec::new(),
        };
        edges.push(EdgeLayout {
            id: rel.id.clone(),
            from: rel.parent_id.clone(),
            to: rel.child_id.clone(),
            stroke_width: stroke_width(mode, child_level, config),
            points,
        });
    }
    if skipped > 0 {
        tracing::debug!(skipped, "relationships outside the reachable tree");
    }
    edges
}

/// Thickest into the root, halving per generation in ancestors mode.
pub fn stroke_width(mode: LayoutMode, child_level: u32, config: &LayoutConfig) -> f32 {
    match mode {
        LayoutMode::Ancestors => {
            let divisor = 2f32.powi(child_level.min(64) as i32);
            (config.edge_base_width / divisor)
                .round()
                .max(config.edge_min_width)
        }
        LayoutMode::Descendants => config.edge_min_width,
    }
}

/// Parent center, down (or up) to the vertical midpoint, across, then into
/// the child center.
fn smooth_step(from: (f32, f32), to: (f32, f32)) -> Vec<(f32, f32)> {
    let mid_y = (from.1 + to.1) / 2.0;
    vec![from, (from.0, mid_y), (to.0, mid_y), to]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Person, PersonData, Relationship};
    use crate::layout::levels::assign_levels;

    fn graph(ids: &[&str], rels: &[(&str, &str, &str)]) -> FamilyGraph {
        FamilyGraph {
            persons: ids
                .iter()
                .map(|id| Person::new(*id, PersonData::default()))
                .collect(),
            relationships: rels
                .iter()
                .map(|(id, p, c)| Relationship::new(*id, *p, *c))
                .collect(),
        }
    }

    #[test]
    fn stroke_halves_per_generation_down_to_minimum() {
        let config = LayoutConfig::default();
        let widths: Vec<f32> = (0..5)
            .map(|level| stroke_width(LayoutMode::Ancestors, level, &config))
            .collect();
        assert_eq!(widths, vec![40.0, 20.0, 10.0, 5.0, 4.0]);
        assert_eq!(stroke_width(LayoutMode::Ancestors, 200, &config), 4.0);
        assert_eq!(stroke_width(LayoutMode::Descendants, 0, &config), 4.0);
    }

    #[test]
    fn only_reachable_relationships_become_edges() {
        let g = graph(
            &["me", "dad", "kid", "stranger"],
            &[("r1", "dad", "me"), ("r2", "me", "kid"), ("r3", "stranger", "kid")],
        );
        let levels = assign_levels(&g, "me", LayoutMode::Ancestors);
        let edges = compute_edges(&g, &levels, &PositionMap::new(), LayoutMode::Ancestors, &LayoutConfig::default());
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].id, "r1");
        assert_eq!(edges[0].from, "dad");
        assert_eq!(edges[0].to, "me");
        assert_eq!(edges[0].stroke_width, 40.0);
        assert!(edges[0].points.is_empty());
    }

    #[test]
    fn routes_bend_at_mid_height() {
        let g = graph(&["me", "dad"], &[("r1", "dad", "me")]);
        let levels = assign_levels(&g, "me", LayoutMode::Ancestors);
        let positions: PositionMap = [
            ("me".to_string(), (0.0, 0.0)),
            ("dad".to_string(), (-130.0, -250.0)),
        ]
        .into_iter()
        .collect();
        let edges = compute_edges(&g, &levels, &positions, LayoutMode::Ancestors, &LayoutConfig::default());
        assert_eq!(
            edges[0].points,
            vec![(-130.0, -250.0), (-130.0, -125.0), (0.0, -125.0), (0.0, 0.0)]
        );
    }
}
