#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod kinship;
pub mod layout;
pub mod layout_dump;
pub mod mutation;
pub mod parser;
pub mod render;
pub mod store;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;

use crate::config::{LayoutConfig, RenderConfig};
use crate::ir::FamilyGraph;
use crate::layout::{Layout, LayoutRequest, compute_layout};
use crate::theme::Theme;

/// Everything a one-shot layout or render needs besides the input document.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    pub request: LayoutRequest,
}

impl RenderOptions {
    pub fn heritage() -> Self {
        Self::with_theme(Theme::heritage())
    }

    pub fn modern() -> Self {
        Self::with_theme(Theme::modern())
    }

    fn with_theme(theme: Theme) -> Self {
        let render = RenderConfig {
            background: theme.background.clone(),
            ..RenderConfig::default()
        };
        Self {
            theme,
            render,
            ..Self::default()
        }
    }
}

/// Parses a graph or tree document and lays it out.
pub fn layout_with_options(input: &str, options: &RenderOptions) -> anyhow::Result<(FamilyGraph, Layout)> {
    let parsed = parser::parse_family(input)?;
    let layout = compute_layout(&parsed.graph, &options.request, &options.layout)?;
    Ok((parsed.graph, layout))
}

pub fn render_with_options(input: &str, options: RenderOptions) -> anyhow::Result<String> {
    let (graph, layout) = layout_with_options(input, &options)?;
    Ok(render::render_svg(&layout, &graph, &options.theme, &options.render))
}
