use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    /// Center-to-center distance between the two members of a couple.
    pub couple_gap: f32,
    /// Minimum center-to-center distance between any two persons on one tier.
    pub branch_gap: f32,
    pub level_gap: f32,
    /// Lateral offset between neighbouring groups on the first tier.
    pub group_spread: f32,
    /// Fraction of `group_spread` lost per generation away from the root.
    pub group_spread_decay: f32,
    pub edge_base_width: f32,
    pub edge_min_width: f32,
    pub union_marker_size: f32,
    pub union_marker_drop: f32,
    /// Horizontal offset of each ring from the couple midpoint, relative to the
    /// ring size. Values below 0.5 make the two rings overlap.
    pub union_marker_overlap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            node_height: 180.0,
            couple_gap: 260.0,
            branch_gap: 240.0,
            level_gap: 250.0,
            group_spread: 1200.0,
            group_spread_decay: 0.25,
            edge_base_width: 40.0,
            edge_min_width: 4.0,
            union_marker_size: 28.0,
            union_marker_drop: 40.0,
            union_marker_overlap: 0.3,
        }
    }
}

impl LayoutConfig {
    /// Group spread for a tier, shrinking with distance from the root and
    /// floored at three couple gaps.
    pub fn spread_at(&self, level: u32) -> f32 {
        let steps = level.saturating_sub(1) as f32;
        let factor = (1.0 - self.group_spread_decay * steps).max(0.0);
        (self.group_spread * factor).max(self.couple_gap * 3.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub padding: f32,
    pub show_dates: bool,
    pub show_union_markers: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
            padding: 60.0,
            show_dates: true,
            show_union_markers: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::heritage();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    node_fill: Option<String>,
    node_border: Option<String>,
    root_fill: Option<String>,
    text_color: Option<String>,
    muted_text_color: Option<String>,
    edge_color: Option<String>,
    union_ring_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    couple_gap: Option<f32>,
    branch_gap: Option<f32>,
    level_gap: Option<f32>,
    group_spread: Option<f32>,
    group_spread_decay: Option<f32>,
    edge_base_width: Option<f32>,
    edge_min_width: Option<f32>,
    union_marker_size: Option<f32>,
    union_marker_drop: Option<f32>,
    union_marker_overlap: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    padding: Option<f32>,
    show_dates: Option<bool>,
    show_union_markers: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a config document (JSON or JSON5) on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::by_name(theme_name) {
            Some(theme) => config.theme = theme,
            None => tracing::warn!(theme = theme_name, "unknown theme name, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        apply_theme_variables(&mut config.theme, vars);
    }
    config.render.background = config.theme.background.clone();

    if let Some(layout) = parsed.layout {
        apply_layout_overrides(&mut config.layout, layout);
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.padding {
            config.render.padding = v;
        }
        if let Some(v) = render.show_dates {
            config.render.show_dates = v;
        }
        if let Some(v) = render.show_union_markers {
            config.render.show_union_markers = v;
        }
    }

    Ok(config)
}

fn apply_theme_variables(theme: &mut Theme, vars: ThemeVariables) {
    if let Some(v) = vars.font_family {
        theme.font_family = v;
    }
    if let Some(v) = vars.font_size {
        theme.font_size = v;
    }
    if let Some(v) = vars.node_fill {
        theme.node_fill = v;
    }
    if let Some(v) = vars.node_border {
        theme.node_border = v;
    }
    if let Some(v) = vars.root_fill {
        theme.root_fill = v;
    }
    if let Some(v) = vars.text_color {
        theme.text_color = v;
    }
    if let Some(v) = vars.muted_text_color {
        theme.muted_text_color = v;
    }
    if let Some(v) = vars.edge_color {
        theme.edge_color = v;
    }
    if let Some(v) = vars.union_ring_color {
        theme.union_ring_color = v;
    }
    if let Some(v) = vars.background {
        theme.background = v;
    }
}

fn apply_layout_overrides(layout: &mut LayoutConfig, file: LayoutConfigFile) {
    if let Some(v) = file.node_width {
        layout.node_width = v;
    }
    if let Some(v) = file.node_height {
        layout.node_height = v;
    }
    if let Some(v) = file.couple_gap {
        layout.couple_gap = v;
    }
    if let Some(v) = file.branch_gap {
        layout.branch_gap = v;
    }
    if let Some(v) = file.level_gap {
        layout.level_gap = v;
    }
    if let Some(v) = file.group_spread {
        layout.group_spread = v;
    }
    if let Some(v) = file.group_spread_decay {
        layout.group_spread_decay = v;
    }
    if let Some(v) = file.edge_base_width {
        layout.edge_base_width = v;
    }
    if let Some(v) = file.edge_min_width {
        layout.edge_min_width = v;
    }
    if let Some(v) = file.union_marker_size {
        layout.union_marker_size = v;
    }
    if let Some(v) = file.union_marker_drop {
        layout.union_marker_drop = v;
    }
    if let Some(v) = file.union_marker_overlap {
        layout.union_marker_overlap = v;
    }
    // The overlap search steps by these; zero would never advance.
    layout.branch_gap = layout.branch_gap.max(1.0);
    layout.couple_gap = layout.couple_gap.max(1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.branch_gap, LayoutConfig::default().branch_gap);
        assert_eq!(config.theme.edge_color, "#793333");
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let config = parse_config(
            r##"{
                // json5 comments are allowed
                theme: "modern",
                themeVariables: { edgeColor: "#000000" },
                layout: { branchGap: 300, levelGap: 120 },
                render: { showDates: false },
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.font_size, Theme::modern().font_size);
        assert_eq!(config.theme.edge_color, "#000000");
        assert_eq!(config.layout.branch_gap, 300.0);
        assert_eq!(config.layout.level_gap, 120.0);
        assert_eq!(config.layout.couple_gap, LayoutConfig::default().couple_gap);
        assert!(!config.render.show_dates);
    }

    #[test]
    fn spread_shrinks_per_level_with_floor() {
        let config = LayoutConfig::default();
        assert_eq!(config.spread_at(1), config.group_spread);
        assert!(config.spread_at(2) < config.spread_at(1));
        let floor = config.couple_gap * 3.0;
        assert_eq!(config.spread_at(40), floor);
    }
}
