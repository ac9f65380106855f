//! Node styles sent to the render surface.

use serde::Serialize;

use super::NodeHighlight;

pub const DEFAULT_BACKGROUND: &str = "#faf9f9";
pub const SELECTED_BACKGROUND: &str = "#c5fdc5";
pub const EXCLUDED_BACKGROUND: &str = "#d0cece";
pub const DEFAULT_TEXT: &str = "#000";
pub const EXCLUDED_TEXT: &str = "#6a6868";
pub const DEFAULT_BORDER: &str = "#000";
pub const LEAF_BORDER: &str = "#c79f01";

/// CSS-like style record, serialized in camelCase for React Flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub background_color: &'static str,
    pub color: &'static str,
    pub width: &'static str,
    pub border_color: &'static str,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self::for_highlight(NodeHighlight::default())
    }
}

impl NodeStyle {
    pub fn for_highlight(highlight: NodeHighlight) -> Self {
        let background_color = if highlight.selected {
            SELECTED_BACKGROUND
        } else if highlight.excluded {
            EXCLUDED_BACKGROUND
        } else {
            DEFAULT_BACKGROUND
        };

        Self {
            background_color,
            color: if highlight.excluded { EXCLUDED_TEXT } else { DEFAULT_TEXT },
            width: "fit-content",
            border_color: if highlight.included_leaf { LEAF_BORDER } else { DEFAULT_BORDER },
        }
    }
}
