// In-memory permission graph for one organization.
//
// - Keeps the backend's list order; every deterministic tie-break downstream
//   (layout ordering, apex choice, render order) relies on it.
// - Duplicate names replace the earlier record's data but keep its slot.
// - Parent references are not validated; lookups of unknown names return None.

use std::collections::HashMap;

use log::warn;

use super::PermissionNode;

#[derive(Debug, Clone, Default)]
pub struct PermissionGraph {
    nodes: Vec<PermissionNode>,
    index: HashMap<String, usize>,
}

impl PermissionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from the backend's permission list.
    pub fn from_nodes(nodes: impl IntoIterator<Item = PermissionNode>) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert(node);
        }
        graph
    }

    /// Insert a node, replacing any existing node with the same name in place.
    pub fn insert(&mut self, node: PermissionNode) {
        if let Some(&slot) = self.index.get(&node.name) {
            warn!("duplicate permission name '{}', keeping the later record", node.name);
            self.nodes[slot] = node;
        } else {
            self.index.insert(node.name.clone(), self.nodes.len());
            self.nodes.push(node);
        }
    }

    pub fn get(&self, name: &str) -> Option<&PermissionNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of a node in backend order.
    pub fn order_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Parents of a node, or an empty slice for unknown names.
    pub fn parents_of(&self, name: &str) -> &[String] {
        self.get(name).map(|n| n.parents.as_slice()).unwrap_or(&[])
    }

    pub fn is_leaf(&self, name: &str) -> bool {
        self.get(name).is_some_and(PermissionNode::is_leaf)
    }

    /// Nodes in backend order.
    pub fn nodes(&self) -> &[PermissionNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every (parent, child) pair, including ones whose parent is missing.
    pub fn parent_links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.iter().flat_map(|child| {
            child
                .parents
                .iter()
                .map(move |parent| (parent.as_str(), child.name.as_str()))
        })
    }
}
