//! Selection-driven highlighting.
//!
//! Everything here is a pure function of the permission graph and the current
//! selection. Recoloring never touches the layout.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::layout::LayoutEdge;
use crate::model::PermissionGraph;

mod ancestors;
mod style;

pub use ancestors::{AncestorPolicy, DEFAULT_ANCESTOR_POLICY, ancestors_of};
pub use style::NodeStyle;

/// Switches for the behaviours that differed between client builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Dim excluded nodes and colour the selected one.
    pub color_coding: bool,
    /// Border included leaf nodes.
    pub leaf_border: bool,
    /// Add the ancestor walk to the inclusion set of grouping-node selections.
    pub ancestor_union: bool,
    pub ancestor_policy: AncestorPolicy,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            color_coding: true,
            leaf_border: true,
            ancestor_union: true,
            ancestor_policy: DEFAULT_ANCESTOR_POLICY,
        }
    }
}

/// What the user currently has selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub selected_node: Option<String>,
    pub selected_edge: Option<LayoutEdge>,
    /// Empty means "no filter", not "nothing relevant".
    pub included_nodes: BTreeSet<String>,
}

impl SelectionState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Drop the node selection and the inclusion filter, keep the edge.
    pub fn clear_node(&mut self) {
        self.selected_node = None;
        self.included_nodes.clear();
    }

    pub fn is_filtering(&self) -> bool {
        !self.included_nodes.is_empty()
    }
}

/// Highlight class of a single node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodeHighlight {
    pub selected: bool,
    pub excluded: bool,
    pub included_leaf: bool,
}

/// Classify one node against the selection.
pub fn classify_node(
    graph: &PermissionGraph,
    name: &str,
    selection: &SelectionState,
    cfg: &HighlightConfig,
) -> NodeHighlight {
    if !cfg.color_coding {
        return NodeHighlight::default();
    }

    let selected = selection.selected_node.as_deref() == Some(name);
    let filtering = selection.is_filtering();
    let included = selection.included_nodes.contains(name);

    NodeHighlight {
        selected,
        excluded: filtering && !included && !selected,
        included_leaf: cfg.leaf_border && filtering && included && !selected && graph.is_leaf(name),
    }
}

/// Classify every node, in graph order.
pub fn highlight_nodes(
    graph: &PermissionGraph,
    selection: &SelectionState,
    cfg: &HighlightConfig,
) -> Vec<NodeHighlight> {
    graph
        .nodes()
        .iter()
        .map(|n| classify_node(graph, &n.name, selection, cfg))
        .collect()
}

/// Inclusion set for a selected node, given the backend's relevance result.
///
/// Nodes with their own additions or subtractions use the relevance result
/// alone. Pure grouping nodes (leaves) also pull in their ancestor walk when
/// `ancestor_union` is on.
pub fn inclusion_for(
    graph: &PermissionGraph,
    name: &str,
    relevant: impl IntoIterator<Item = String>,
    cfg: &HighlightConfig,
) -> BTreeSet<String> {
    let mut included: BTreeSet<String> = relevant.into_iter().collect();
    if cfg.ancestor_union && graph.contains(name) && graph.is_leaf(name) {
        included.extend(ancestors_of(graph, name, cfg.ancestor_policy));
    }
    included
}
