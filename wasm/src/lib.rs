use family_tree_layout::layout::{LayoutMode, LayoutRequest};
use family_tree_layout::layout_dump::layout_dump_json;
use family_tree_layout::{RenderOptions, layout_with_options, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeViewOptions {
    theme: Option<String>,
    mode: Option<String>,
    root_id: Option<String>,
    identity: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
}

fn parse_options(options_json: Option<String>) -> Result<TreeViewOptions, JsValue> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(TreeViewOptions::default()),
    }
}

fn build_render_options(options: TreeViewOptions) -> Result<RenderOptions, String> {
    let mut render_options = match options.theme.as_deref() {
        Some("modern") => RenderOptions::modern(),
        None | Some("heritage") | Some("default") => RenderOptions::heritage(),
        Some(other) => return Err(format!("unknown theme: {other}")),
    };

    let mode = match options.mode.as_deref() {
        Some(token) => LayoutMode::from_token(token).ok_or_else(|| format!("unknown mode: {token}"))?,
        None => LayoutMode::default(),
    };
    let mut request = LayoutRequest::new(mode);
    request.root_id = options.root_id;
    request.identity_hint = options.identity;
    render_options.request = request;

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    Ok(render_options)
}

/// Lays out a family graph or stored tree document and returns the layout dump as JSON.
#[wasm_bindgen]
pub fn layout_family_tree(input: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = build_render_options(parse_options(options_json)?).map_err(|error| JsValue::from_str(&error))?;
    let (graph, layout) =
        layout_with_options(input, &options).map_err(|error| JsValue::from_str(&error.to_string()))?;
    layout_dump_json(&layout, &graph).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[wasm_bindgen]
pub fn render_family_tree_svg(input: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = build_render_options(parse_options(options_json)?).map_err(|error| JsValue::from_str(&error))?;
    render_with_options(input, options).map_err(|error| JsValue::from_str(&error.to_string()))
}
