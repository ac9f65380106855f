//! Output types for the render surface.
//!
//! These structs are serialized to JSON and handed to the React Flow canvas.

use serde::Serialize;

use crate::highlight::{HighlightConfig, NodeStyle, SelectionState, classify_node};
use crate::layout::{LayoutEdge, LayoutResult, PointI};
use crate::model::PermissionGraph;
use crate::sync::SyncError;

/// Width of every rendered edge.
pub const EDGE_STROKE_WIDTH: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeData {
    pub label: String,
}

/// A positioned, styled node ready for React to display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutput {
    pub id: String,
    /// Centre of the node box.
    pub position: PointI,
    pub data: NodeData,
    pub style: NodeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke_width: u32,
}

/// An edge from a parent to the child it enables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeOutput {
    pub id: String,
    pub source: String,
    pub target: String,
    pub style: EdgeStyle,
}

impl From<&LayoutEdge> for EdgeOutput {
    fn from(edge: &LayoutEdge) -> Self {
        Self {
            id: edge.id(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            style: EdgeStyle { stroke_width: EDGE_STROKE_WIDTH },
        }
    }
}

/// Error information for the host page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

impl From<&SyncError> for ErrorInfo {
    fn from(err: &SyncError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// The combined snapshot sent to React
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramOutput {
    pub nodes: Vec<NodeOutput>,
    pub edges: Vec<EdgeOutput>,
    /// Parent references to unknown nodes; not drawn.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_edges: Vec<EdgeOutput>,
    pub selection: SelectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl DiagramOutput {
    /// An empty diagram carrying only an error.
    pub fn from_error(error: ErrorInfo) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            missing_edges: Vec::new(),
            selection: SelectionState::default(),
            error: Some(error),
        }
    }
}

/// Combine a stored layout with the current selection.
///
/// Only styles depend on the selection; positions come straight from
/// `layout`, so this is cheap enough to run on every click.
pub fn render_diagram(
    graph: &PermissionGraph,
    layout: &LayoutResult,
    selection: &SelectionState,
    cfg: &HighlightConfig,
) -> DiagramOutput {
    let nodes = layout
        .nodes
        .iter()
        .map(|placed| NodeOutput {
            id: placed.id.clone(),
            position: placed.position,
            data: NodeData { label: placed.id.clone() },
            style: NodeStyle::for_highlight(classify_node(graph, &placed.id, selection, cfg)),
        })
        .collect();

    DiagramOutput {
        nodes,
        edges: layout.edges.iter().map(EdgeOutput::from).collect(),
        missing_edges: layout.missing_edges.iter().map(EdgeOutput::from).collect(),
        selection: selection.clone(),
        error: None,
    }
}
