// Layered layout for permission graphs.
//
// Goals:
// - Deterministic: no randomness, ties broken by backend order
// - Layered: every node sits one rank away from its nearest-ranked parent
// - Roots on top: the orientation pass flips the raw layout when needed
// - Tolerant: dangling parent references become missing edges, cycles never hang
//
// Submodules:
// - adjacency: child -> parent layout graph built from the permission list
// - layered: rank assignment, crossing reduction and coordinate assignment
// - orientation: root detection and vertical inversion
//
// Output:
// - LayoutResult with centre positions and sizes in input order, plus the
//   parent -> child edges the render surface draws.

use serde::{Deserialize, Serialize};

use log::debug;

use crate::model::{PermissionGraph, PermissionNode};

mod adjacency;
mod layered;
mod orientation;

use adjacency::LayerGraph;
use layered::{assign_coordinates, assign_ranks, build_layers, order_layers};

pub use orientation::{correct_orientation, find_roots};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointI {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeI {
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width contributed by each label character.
    pub char_width: i32,
    /// Fixed horizontal padding added to every node.
    pub label_padding: i32,
    /// Height of every node.
    pub node_height: i32,
    /// Horizontal gap between neighbouring nodes in a rank.
    pub node_sep: i32,
    /// Horizontal gap reserved around edges passing through a rank.
    pub edge_sep: i32,
    /// Vertical gap between ranks.
    pub rank_sep: i32,
    /// Barycenter sweeps used for crossing reduction.
    pub ordering_sweeps: usize,
    /// Neighbour-averaging passes used to straighten edges.
    pub position_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            char_width: 6,
            label_padding: 50,
            node_height: 100,
            node_sep: 50,
            edge_sep: 20,
            rank_sep: 50,
            ordering_sweeps: 4,
            position_passes: 4,
        }
    }
}

impl LayoutConfig {
    /// Size of a node box for the given display label.
    pub fn node_size(&self, label: &str) -> SizeI {
        SizeI {
            w: label.chars().count() as i32 * self.char_width + self.label_padding,
            h: self.node_height,
        }
    }
}

/// A node with its centre position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedNode {
    pub id: String,
    pub position: PointI,
    pub size: SizeI,
}

/// A render edge, pointing from a parent to the child it enables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayoutEdge {
    pub source: String,
    pub target: String,
}

impl LayoutEdge {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self { source: parent.into(), target: child.into() }
    }

    /// Stable id shared with the render surface.
    pub fn id(&self) -> String {
        format!("{}_to_{}", self.target, self.source)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutResult {
    /// Positioned nodes, in backend order.
    pub nodes: Vec<PlacedNode>,
    /// Edges between nodes that both exist.
    pub edges: Vec<LayoutEdge>,
    /// Parent references that point at unknown nodes.
    pub missing_edges: Vec<LayoutEdge>,
    /// Whether the orientation pass flipped the raw layout.
    pub inverted: bool,
}

impl LayoutResult {
    pub fn position_of(&self, id: &str) -> Option<PointI> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.position)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Lay out an ordered permission list.
pub fn layout_nodes(nodes: &[PermissionNode], cfg: &LayoutConfig) -> LayoutResult {
    layout_permissions(&PermissionGraph::from_nodes(nodes.iter().cloned()), cfg)
}

/// Lay out a permission graph: layered placement followed by orientation correction.
pub fn layout_permissions(graph: &PermissionGraph, cfg: &LayoutConfig) -> LayoutResult {
    if graph.is_empty() {
        return LayoutResult::default();
    }

    let layer_graph = LayerGraph::from_graph(graph);
    let ranking = assign_ranks(&layer_graph);
    let mut layers = build_layers(&layer_graph, &ranking, cfg);
    order_layers(&mut layers, cfg.ordering_sweeps);
    let centres = assign_coordinates(&layers, cfg);

    let mut nodes: Vec<PlacedNode> = graph
        .nodes()
        .iter()
        .zip(centres)
        .map(|(node, position)| PlacedNode {
            id: node.name.clone(),
            position,
            size: cfg.node_size(&node.name),
        })
        .collect();

    let roots = find_roots(graph.nodes());
    let inverted = correct_orientation(&mut nodes, &roots);
    debug!(
        "laid out {} nodes over {} ranks (inverted: {})",
        nodes.len(),
        ranking.rank_count,
        inverted
    );

    LayoutResult {
        nodes,
        edges: layer_graph.render_edges(),
        missing_edges: layer_graph.missing_edges().to_vec(),
        inverted,
    }
}
