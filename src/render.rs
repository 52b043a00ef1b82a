use crate::config::RenderConfig;
use crate::ir::FamilyGraph;
use crate::kinship::{full_name, initial, life_years};
use crate::layout::{Layout, NodeLayout};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

pub fn render_svg(layout: &Layout, graph: &FamilyGraph, theme: &Theme, config: &RenderConfig) -> String {
    let mut svg = String::new();
    let pad = config.padding.max(0.0);
    let width = (layout.width + pad * 2.0).max(200.0);
    let height = (layout.height + pad * 2.0).max(200.0);
    let shift_x = pad - layout.min_x;
    let shift_y = pad - layout.min_y;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        config.background
    ));
    svg.push_str(&format!("<g transform=\"translate({shift_x:.2} {shift_y:.2})\">"));

    for edge in &layout.edges {
        if edge.points.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            "<path class=\"edge\" data-id=\"{}\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.1}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
            escape_xml(&edge.id),
            points_to_path(&edge.points),
            theme.edge_color,
            edge.stroke_width
        ));
    }

    if config.show_union_markers {
        for ring in layout.union_nodes() {
            svg.push_str(&format!(
                "<circle class=\"union\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"3\"/>",
                ring.x,
                ring.y,
                ring.width / 2.0,
                theme.union_ring_color
            ));
        }
    }

    for node in layout.person_nodes() {
        svg.push_str(&person_card_svg(node, graph, theme, config));
    }

    svg.push_str("</g></svg>");
    svg
}

fn person_card_svg(node: &NodeLayout, graph: &FamilyGraph, theme: &Theme, config: &RenderConfig) -> String {
    let mut out = String::new();
    let left = node.x - node.width / 2.0;
    let top = node.y - node.height / 2.0;
    let fill = if node.is_root { &theme.root_fill } else { &theme.node_fill };

    out.push_str(&format!(
        "<g class=\"person\" data-id=\"{}\">",
        escape_xml(&node.id)
    ));

    if let Some(decoration) = node.decoration {
        let w = node.width * 0.5 * decoration.scale;
        let h = node.height * 0.5 * decoration.scale;
        out.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"24\" fill=\"{}\" opacity=\"0.35\" transform=\"rotate({:.0} {:.2} {:.2})\"/>",
            node.x - w / 2.0,
            node.y - h / 2.0,
            w,
            h,
            theme.node_border,
            decoration.rotation_deg,
            node.x,
            node.y
        ));
    }

    out.push_str(&format!(
        "<rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"14\" ry=\"14\" fill=\"{fill}\" stroke=\"{}\" stroke-width=\"1.6\"/>",
        node.width,
        node.height,
        theme.node_border
    ));

    let Some(person) = graph.person(&node.id) else {
        out.push_str("</g>");
        return out;
    };

    let badge_r = (node.width.min(node.height) * 0.18).max(8.0);
    let badge_y = top + badge_r + 14.0;
    out.push_str(&format!(
        "<circle cx=\"{:.2}\" cy=\"{badge_y:.2}\" r=\"{badge_r:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
        node.x, theme.background, theme.node_border
    ));
    out.push_str(&text_svg(
        node.x,
        badge_y + theme.font_size * 0.35,
        &initial(person),
        theme.font_size * 1.2,
        &theme.text_color,
        theme,
    ));

    let name_y = badge_y + badge_r + theme.font_size * 1.6;
    out.push_str(&text_svg(node.x, name_y, &full_name(person), theme.font_size, &theme.text_color, theme));

    if config.show_dates {
        let years = life_years(person);
        if !years.is_empty() {
            out.push_str(&text_svg(
                node.x,
                name_y + theme.font_size * 1.4,
                &years,
                theme.font_size * 0.85,
                &theme.muted_text_color,
                theme,
            ));
        }
    }

    out.push_str("</g>");
    out
}

fn text_svg(x: f32, y: f32, text: &str, size: f32, fill: &str, theme: &Theme) -> String {
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{size:.1}\" fill=\"{fill}\">{}</text>",
        escape_xml(&theme.font_family),
        escape_xml(text)
    )
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let Some(first) = points.first() else {
        return String::new();
    };
    let mut d = format!("M {:.2} {:.2}", first.0, first.1);
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Georgia".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{Gender, Person, PersonData, Relationship};
    use crate::layout::{LayoutRequest, compute_layout};

    fn graph() -> FamilyGraph {
        let person = |id: &str, first: &str, gender| {
            Person::new(
                id,
                PersonData {
                    first_name: first.into(),
                    last_name: "O'Neil".into(),
                    gender: Some(gender),
                    birth_date: Some("1931".into()),
                    death_date: Some("2001".into()),
                    ..PersonData::default()
                },
            )
        };
        FamilyGraph {
            persons: vec![
                person("kid", "Kim", Gender::Female),
                person("dad", "Dan", Gender::Male),
                person("mom", "Mia", Gender::Female),
            ],
            relationships: vec![
                Relationship::new("r1", "dad", "kid"),
                Relationship::new("r2", "mom", "kid"),
            ],
        }
    }

    #[test]
    fn render_svg_basic() {
        let graph = graph();
        let layout = compute_layout(&graph, &LayoutRequest::default(), &LayoutConfig::default()).unwrap();
        let svg = render_svg(&layout, &graph, &Theme::heritage(), &RenderConfig::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Kim O&apos;Neil"));
        assert!(svg.contains("1931-2001"));
        assert!(svg.contains("#793333"));
        assert_eq!(svg.matches("class=\"union\"").count(), 2);
        assert_eq!(svg.matches("class=\"edge\"").count(), 2);
    }

    #[test]
    fn markers_and_dates_can_be_hidden() {
        let graph = graph();
        let layout = compute_layout(&graph, &LayoutRequest::default(), &LayoutConfig::default()).unwrap();
        let config = RenderConfig {
            show_dates: false,
            show_union_markers: false,
            ..RenderConfig::default()
        };
        let svg = render_svg(&layout, &graph, &Theme::modern(), &config);
        assert!(!svg.contains("class=\"union\""));
        assert!(!svg.contains("1931-2001"));
    }

    #[test]
    fn path_from_points() {
        assert_eq!(points_to_path(&[]), "");
        assert_eq!(
            points_to_path(&[(0.0, 0.0), (0.0, 5.0)]),
            "M 0.00 0.00 L 0.00 5.00"
        );
    }
}
