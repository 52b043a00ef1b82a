use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub node_fill: String,
    pub node_border: String,
    pub root_fill: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub edge_color: String,
    pub union_ring_color: String,
    pub background: String,
}

impl Theme {
    /// Warm parchment palette: bark-coloured branches and golden union rings.
    pub fn heritage() -> Self {
        Self {
            font_family: "Georgia, \"Times New Roman\", serif".to_string(),
            font_size: 15.0,
            node_fill: "#FFF8EC".to_string(),
            node_border: "#8A6D3B".to_string(),
            root_fill: "#F3E2BF".to_string(),
            text_color: "#3B2A1A".to_string(),
            muted_text_color: "#7A6652".to_string(),
            edge_color: "#793333".to_string(),
            union_ring_color: "#E1CD34".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            node_fill: "#F8FAFF".to_string(),
            node_border: "#C7D2E5".to_string(),
            root_fill: "#E3EBFA".to_string(),
            text_color: "#1C2430".to_string(),
            muted_text_color: "#5B6B84".to_string(),
            edge_color: "#7A8AA6".to_string(),
            union_ring_color: "#D4A72C".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "heritage" | "default" => Some(Self::heritage()),
            "modern" => Some(Self::modern()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::heritage()
    }
}
